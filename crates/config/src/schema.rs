//! Bridge configuration schema.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// Platform sections are kept as raw JSON values; each channel plugin
/// deserializes its own account config from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Discord account settings (`token`, `bind_command`).
    pub discord: serde_json::Value,
    /// Telegram account settings (`token`, `bind_command`, `poll_timeout_secs`).
    pub telegram: serde_json::Value,
    pub relay: RelayConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discord: serde_json::Value::Object(Default::default()),
            telegram: serde_json::Value::Object(Default::default()),
            relay: RelayConfig::default(),
        }
    }
}

/// Where an author's alias handle goes in the relayed text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AliasPlacement {
    /// `@alice_tg Alice: hi`
    #[default]
    Prepend,
    /// `Alice: hi @alice_tg`
    Append,
}

/// Relay behaviour shared by both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Path of the binding document. Relative paths resolve against the
    /// working directory.
    pub binding_file: PathBuf,
    pub alias_placement: AliasPlacement,
    /// Prefix messages from threads with the thread name.
    pub scope_markers: bool,
    /// Send relayed replies as replies on the other side.
    pub reply_threading: bool,
    /// Maximum remembered correlations per direction; 0 means unbounded.
    pub correlation_capacity: usize,
    /// Inbound event queue size per platform.
    pub event_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            binding_file: PathBuf::from("binding.toml"),
            alias_placement: AliasPlacement::default(),
            scope_markers: true,
            reply_threading: true,
            correlation_capacity: 10_000,
            event_buffer: 256,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.relay.binding_file, PathBuf::from("binding.toml"));
        assert_eq!(cfg.relay.alias_placement, AliasPlacement::Prepend);
        assert!(cfg.relay.scope_markers);
        assert!(cfg.relay.reply_threading);
        assert_eq!(cfg.relay.correlation_capacity, 10_000);
        assert!(cfg.discord.is_object());
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            [discord]
            token = "abc"

            [telegram]
            bind_command = "/link"
            poll_timeout_secs = 30

            [relay]
            alias_placement = "append"
            correlation_capacity = 0
        "#;
        let cfg: BridgeConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.discord["token"], "abc");
        assert_eq!(cfg.telegram["bind_command"], "/link");
        assert_eq!(cfg.relay.alias_placement, AliasPlacement::Append);
        assert_eq!(cfg.relay.correlation_capacity, 0);
        // unspecified fields keep their defaults
        assert!(cfg.relay.reply_threading);
        assert_eq!(cfg.relay.event_buffer, 256);
    }
}
