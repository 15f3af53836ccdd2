//! Telegram channel plugin for chatbridge.
//!
//! Implements `ChannelPlugin` using teloxide long polling to receive
//! messages and the Bot API to send relayed text.

pub mod bot;
pub mod config;
pub mod handlers;
pub mod outbound;
pub mod plugin;
pub mod state;

pub use {config::TelegramAccountConfig, outbound::TelegramOutbound, plugin::TelegramPlugin};
