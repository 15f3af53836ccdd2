//! Outbound text composition.

use {
    chatbridge_channels::Platform,
    chatbridge_config::{AliasPlacement, BindingState},
};

use crate::error::RelayError;

/// Pieces of a relayed message.
#[derive(Debug, Clone, Copy)]
pub struct Relayed<'a> {
    pub author: &'a str,
    pub alias: Option<&'a str>,
    /// Name of the thread / child conversation the message came from.
    pub scope: Option<&'a str>,
    pub text: &'a str,
    pub placement: AliasPlacement,
}

/// Render a relayed message for `target`, truncated to its length limit.
///
/// `[#scope] @alias Author: text` with the default placement, or
/// `[#scope] Author: text @alias` when appending.
pub fn compose(parts: &Relayed<'_>, target: Platform) -> String {
    let mut out = String::with_capacity(parts.text.len() + parts.author.len() + 16);
    if let Some(scope) = parts.scope {
        out.push_str("[#");
        out.push_str(scope);
        out.push_str("] ");
    }
    if let (Some(alias), AliasPlacement::Prepend) = (parts.alias, parts.placement) {
        out.push_str(alias);
        out.push(' ');
    }
    out.push_str(&author_label(parts.author, target));
    out.push_str(": ");
    out.push_str(parts.text);
    if let (Some(alias), AliasPlacement::Append) = (parts.alias, parts.placement) {
        out.push(' ');
        out.push_str(alias);
    }
    truncate(out, target)
}

/// Author name styled for the target platform.
///
/// Discord renders markdown, so the name is bolded with its markdown
/// metacharacters escaped. Telegram messages go out without a parse mode.
pub fn author_label(name: &str, target: Platform) -> String {
    match target {
        Platform::Discord => format!("**{}**", escape_discord_markdown(name)),
        Platform::Telegram => name.to_string(),
    }
}

fn escape_discord_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '~' | '`' | '|' | '>') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Length of `ch` as the target platform counts it. Telegram limits are in
/// UTF-16 code units.
fn char_len(ch: char, target: Platform) -> usize {
    match target {
        Platform::Discord => 1,
        Platform::Telegram => ch.len_utf16(),
    }
}

/// Cut `text` to the target's message length limit, ending with an ellipsis.
pub fn truncate(text: String, target: Platform) -> String {
    let max = target.max_message_len();
    if text.chars().map(|ch| char_len(ch, target)).sum::<usize>() <= max {
        return text;
    }
    let budget = max.saturating_sub(char_len('…', target));
    let mut used = 0;
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        used += char_len(ch, target);
        if used > budget {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

/// Acknowledgement sent back after a successful bind command.
pub fn bind_ack(origin: Platform, channel_id: &str, state: BindingState) -> String {
    let noun = match origin {
        Platform::Discord => "channel",
        Platform::Telegram => "chat",
    };
    let status = if state == BindingState::FullyBound {
        "Relay is active."
    } else {
        "Waiting for the other side to bind."
    };
    format!(
        "✅ {} {noun} registered: {channel_id}. {status}",
        origin.display_name()
    )
}

/// One-line reply sent when a bind command could not be completed.
pub fn bind_failure(error: &RelayError) -> String {
    match error {
        RelayError::ConfigIo(_) => "❌ Failed to save binding configuration.".to_string(),
        other => format!("❌ Cannot bind here: {other}"),
    }
}
