//! Channel adapter contract.
//!
//! Each chat platform (Discord, Telegram) implements [`ChannelPlugin`] to
//! feed [`MessageEvent`]s into the relay, and [`ChannelOutbound`] to send
//! relayed text and answer channel metadata lookups.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{
        ChannelKind, ChannelMetadata, ChannelOutbound, ChannelPlugin, EventReceiver, EventSender,
        MessageEvent, Platform, event_channel,
    },
};
