use std::fmt;

use chatbridge_config::BindingConfig;

/// Which end of the binding a relay direction reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Events from the source channel, relayed to the destination chat.
    Source,
    /// Events from the destination chat, relayed to the source channel.
    Destination,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }

    /// Bind keyword used when none is configured.
    pub fn default_bind_command(self) -> &'static str {
        match self {
            Self::Source => "/syn",
            Self::Destination => "/ack",
        }
    }

    /// Id this side is bound to, as carried on events (empty when unbound).
    pub fn bound_id(self, binding: &BindingConfig) -> String {
        match self {
            Self::Source => binding.source_channel_id.clone(),
            Self::Destination if binding.dest_chat_id == 0 => String::new(),
            Self::Destination => binding.dest_chat_id.to_string(),
        }
    }

    /// Id messages from this side are relayed to.
    pub fn target_id(self, binding: &BindingConfig) -> String {
        self.opposite().bound_id(binding)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Destination => "destination",
        })
    }
}
