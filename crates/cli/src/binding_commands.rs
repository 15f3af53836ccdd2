use std::path::Path;

use {
    anyhow::{Context, Result},
    chatbridge_config::{BindingConfig, BindingStore},
    clap::Subcommand,
};

#[derive(Subcommand)]
pub enum BindingAction {
    /// Print the binding state and document.
    Show,
    /// Manage display-name aliases.
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
    /// Reset both ids and all aliases.
    Clear,
}

#[derive(Subcommand)]
pub enum AliasAction {
    /// Map a display name to a handle on the other platform.
    Set {
        /// Display name as it appears on the posting platform.
        name: String,
        /// Handle added to relayed messages (e.g. `@alice_tg`).
        handle: String,
    },
    /// Remove the alias for a display name.
    Remove { name: String },
}

/// Edits apply to the document on disk; a running bridge picks them up on
/// its next start.
pub fn handle_binding(action: BindingAction, binding_file: &Path) -> Result<()> {
    let store = BindingStore::open(binding_file).with_context(|| {
        format!("failed to open binding document {}", binding_file.display())
    })?;

    match action {
        BindingAction::Show => print!("{}", describe(&store.snapshot(), store.path())),
        BindingAction::Alias {
            action: AliasAction::Set { name, handle },
        } => {
            store.set_alias(&name, &handle)?;
            println!("Alias set: {name} -> {handle}");
        },
        BindingAction::Alias {
            action: AliasAction::Remove { name },
        } => {
            if store.remove_alias(&name)? {
                println!("Alias removed: {name}");
            } else {
                println!("No alias for {name}.");
            }
        },
        BindingAction::Clear => {
            store.clear()?;
            println!("Binding cleared.");
        },
    }
    Ok(())
}

fn describe(cfg: &BindingConfig, path: &Path) -> String {
    let or_unbound = |id: String| if id.is_empty() { "(unbound)".to_string() } else { id };

    let mut out = format!("Binding:     {}\n", path.display());
    out.push_str(&format!("State:       {}\n", cfg.state()));
    out.push_str(&format!(
        "Discord:     {}\n",
        or_unbound(cfg.source_channel_id.clone())
    ));
    let dest = if cfg.dest_chat_id == 0 {
        String::new()
    } else {
        cfg.dest_chat_id.to_string()
    };
    out.push_str(&format!("Telegram:    {}\n", or_unbound(dest)));

    if cfg.aliases.is_empty() {
        out.push_str("Aliases:     (none)\n");
    } else {
        out.push_str("Aliases:\n");
        for (name, handle) in &cfg.aliases {
            out.push_str(&format!("  {name} -> {handle}\n"));
        }
    }
    out
}
