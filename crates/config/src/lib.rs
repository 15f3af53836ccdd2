//! Configuration for the bridge process and the persisted channel binding.
//!
//! Bridge settings: `chatbridge.toml`, `chatbridge.yaml` or `chatbridge.json`,
//! searched in `./` then `~/.config/chatbridge/`.
//!
//! The binding document (`binding.toml` by default) is owned by
//! [`BindingStore`] and rewritten after every bind command.

pub mod binding;
pub mod error;
pub mod format;
pub mod loader;
pub mod schema;
pub mod store;

pub use {
    binding::{BindingConfig, BindingState},
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{AliasPlacement, BridgeConfig, RelayConfig},
    store::BindingStore,
};
