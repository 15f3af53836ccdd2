mod binding_commands;
mod run;

use std::path::PathBuf;

use {
    anyhow::Context,
    chatbridge_config::BridgeConfig,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "chatbridge", about = "chatbridge: relay between Discord and Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Bridge config file (default: discover chatbridge.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "CHATBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Binding document (overrides `relay.binding_file`).
    #[arg(long, global = true, env = "CHATBRIDGE_BINDING_FILE")]
    binding_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge (default when no subcommand is provided).
    Run,
    /// Inspect or edit the persisted channel binding.
    Binding {
        #[command(subcommand)]
        action: binding_commands::BindingAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Explicit `--config` must load; discovery falls back to defaults.
fn load_bridge_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let mut config = match &cli.config {
        Some(path) => chatbridge_config::load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => chatbridge_config::discover_and_load(),
    };
    chatbridge_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_bridge_config(&cli)?;
    let binding_file = cli
        .binding_file
        .clone()
        .unwrap_or_else(|| config.relay.binding_file.clone());

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "chatbridge starting");
            run::run_bridge(config, binding_file).await
        },
        Some(Commands::Binding { action }) => {
            binding_commands::handle_binding(action, &binding_file)
        },
    }
}
