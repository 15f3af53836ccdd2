//! Discord channel plugin for chatbridge.
//!
//! Implements `ChannelPlugin` on top of a serenity gateway client: inbound
//! guild messages become relay events, outbound text goes through the
//! client's HTTP handle.

pub mod config;
pub mod handler;
pub mod outbound;
pub mod plugin;
pub mod state;

pub use {config::DiscordAccountConfig, outbound::DiscordOutbound, plugin::DiscordPlugin};
