use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// The persisted association between one source channel and one
/// destination chat, plus the display-name → handle alias map.
///
/// Every field defaults so hand-edited documents with missing keys still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Channel id on the source platform (Discord snowflake as a string).
    pub source_channel_id: String,
    /// Chat id on the destination platform (Telegram chat id). Zero = unset.
    pub dest_chat_id: i64,
    /// Display name → handle. Keys are matched case-sensitively.
    pub aliases: BTreeMap<String, String>,
}

impl BindingConfig {
    pub fn state(&self) -> BindingState {
        match (!self.source_channel_id.is_empty(), self.dest_chat_id != 0) {
            (false, false) => BindingState::Unbound,
            (true, false) => BindingState::SourceBound,
            (false, true) => BindingState::DestinationBound,
            (true, true) => BindingState::FullyBound,
        }
    }

    /// Relay only fires once both ids are set.
    pub fn is_ready(&self) -> bool {
        self.state() == BindingState::FullyBound
    }

    pub fn alias_for(&self, display_name: &str) -> Option<&str> {
        self.aliases.get(display_name).map(String::as_str)
    }
}

/// Handshake progress of the binding.
///
/// Moves forward only through bind commands; `FullyBound` is terminal for
/// the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    SourceBound,
    DestinationBound,
    FullyBound,
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unbound => "unbound",
            Self::SourceBound => "source bound",
            Self::DestinationBound => "destination bound",
            Self::FullyBound => "fully bound",
        };
        f.write_str(s)
    }
}
