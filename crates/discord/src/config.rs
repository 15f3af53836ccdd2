use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default bind command on the Discord side.
pub const DEFAULT_BIND_COMMAND: &str = "/syn";

/// Configuration for the Discord bot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordAccountConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Command that binds the channel it is posted in as the source.
    pub bind_command: String,
}

impl DiscordAccountConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for DiscordAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordAccountConfig")
            .field("token", &"[REDACTED]")
            .field("bind_command", &self.bind_command)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for DiscordAccountConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            bind_command: DEFAULT_BIND_COMMAND.into(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = DiscordAccountConfig::default();
        assert_eq!(cfg.bind_command, "/syn");
        assert!(!cfg.has_token());
    }

    #[test]
    fn deserialize_partial() {
        let cfg: DiscordAccountConfig =
            serde_json::from_str(r#"{ "token": "abc.def" }"#).unwrap();
        assert_eq!(cfg.token.expose_secret(), "abc.def");
        assert_eq!(cfg.bind_command, "/syn");
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = DiscordAccountConfig {
            token: Secret::new("abc.secret".into()),
            bind_command: "!bridge".into(),
        };
        let out = format!("{cfg:?}");
        assert!(out.contains("[REDACTED]"));
        assert!(out.contains("!bridge"));
        assert!(!out.contains("abc.secret"));
    }
}
