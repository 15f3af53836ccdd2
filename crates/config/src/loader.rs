use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    format::DocumentFormat,
    schema::BridgeConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "chatbridge.toml",
    "chatbridge.yaml",
    "chatbridge.yml",
    "chatbridge.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    DocumentFormat::from_path(path)?.parse(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./chatbridge.{toml,yaml,yml,json}`
/// 2. `~/.config/chatbridge/chatbridge.{toml,yaml,yml,json}`
///
/// Returns `BridgeConfig::default()` if no file is found or it fails to load.
pub fn discover_and_load() -> BridgeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BridgeConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/chatbridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chatbridge").map(|d| d.config_dir().to_path_buf())
}

/// Overlay `DISCORD_TOKEN` / `TELEGRAM_TOKEN` from the process environment.
pub fn apply_env_overrides(config: &mut BridgeConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut BridgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_blank = |var: &str| lookup(var).filter(|t| !t.trim().is_empty());
    if let Some(token) = non_blank("DISCORD_TOKEN") {
        set_token(&mut config.discord, token);
        debug!("discord token taken from environment");
    }
    if let Some(token) = non_blank("TELEGRAM_TOKEN") {
        set_token(&mut config.telegram, token);
        debug!("telegram token taken from environment");
    }
}

fn set_token(section: &mut serde_json::Value, token: String) {
    if !section.is_object() {
        *section = serde_json::Value::Object(Default::default());
    }
    if let Some(obj) = section.as_object_mut() {
        obj.insert("token".into(), serde_json::Value::String(token));
    }
}
