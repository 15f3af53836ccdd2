use std::{fmt, sync::Arc};

use {async_trait::async_trait, tokio::sync::mpsc};

use crate::Result;

// ── Platforms ───────────────────────────────────────────────────────────────

/// A chat platform the bridge can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Discord,
    Telegram,
}

impl Platform {
    /// Longest text a single outbound message may carry, in characters.
    pub fn max_message_len(self) -> usize {
        match self {
            Self::Discord => 2000,
            Self::Telegram => 4096,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Discord => "Discord",
            Self::Telegram => "Telegram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discord => "discord",
            Self::Telegram => "telegram",
        })
    }
}

// ── Inbound events ──────────────────────────────────────────────────────────

/// One inbound chat message, normalized across platforms.
///
/// Ids are carried as strings so both Discord snowflakes and Telegram
/// integer ids fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub platform: Platform,
    /// Channel or chat the message was posted in. For Discord threads this is
    /// the thread's own channel id.
    pub channel_id: String,
    /// Forum topic / thread id when the platform reports one separately.
    pub thread_id: Option<String>,
    /// Name of that topic, when known.
    pub thread_name: Option<String>,
    pub author_username: String,
    /// Per-server nickname.
    pub author_nickname: Option<String>,
    /// Platform-wide display name.
    pub author_global_name: Option<String>,
    pub text: String,
    pub reply_to_message_id: Option<String>,
    pub message_id: String,
    /// Authored by a bot (including this bridge). Never relayed.
    pub is_self: bool,
}

impl MessageEvent {
    /// Event with only the required fields set.
    pub fn new(
        platform: Platform,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
        author_username: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
            thread_id: None,
            thread_name: None,
            author_username: author_username.into(),
            author_nickname: None,
            author_global_name: None,
            text: text.into(),
            reply_to_message_id: None,
            message_id: message_id.into(),
            is_self: false,
        }
    }

    #[must_use]
    pub fn with_reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to_message_id = Some(message_id.into());
        self
    }

    /// Mark the event as posted in a named topic of `channel_id`.
    #[must_use]
    pub fn in_topic(mut self, thread_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self.thread_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.author_nickname = Some(nickname.into());
        self
    }

    #[must_use]
    pub fn with_global_name(mut self, global_name: impl Into<String>) -> Self {
        self.author_global_name = Some(global_name.into());
        self
    }

    #[must_use]
    pub fn from_self(mut self) -> Self {
        self.is_self = true;
        self
    }
}

/// Sender half of a platform's inbound event queue.
pub type EventSender = mpsc::Sender<MessageEvent>;

/// Receiver half of a platform's inbound event queue.
pub type EventReceiver = mpsc::Receiver<MessageEvent>;

/// Create a bounded inbound event queue.
pub fn event_channel(buffer: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(buffer.max(1))
}

// ── Channel metadata ────────────────────────────────────────────────────────

/// What kind of conversation a channel id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Regular guild text channel.
    Text,
    /// Thread or other child conversation of a parent channel.
    Thread,
    /// One-to-one conversation.
    Direct,
    /// Group chat.
    Group,
    /// Broadcast channel.
    Broadcast,
    Other,
}

/// Result of a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub id: String,
    /// Parent channel for threads / child conversations.
    pub parent_id: Option<String>,
    pub kind: ChannelKind,
    pub name: String,
}

// ── Adapter traits ──────────────────────────────────────────────────────────

/// Send messages to a platform and look up channel metadata.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    fn platform(&self) -> Platform;

    /// Send `text` to `to`, optionally as a reply to `reply_to`.
    /// Returns the id of the created message.
    async fn send_text(&self, to: &str, text: &str, reply_to: Option<&str>) -> Result<String>;

    /// Fetch parent/kind/name for a channel id.
    async fn lookup_metadata(&self, channel_id: &str) -> Result<ChannelMetadata>;
}

/// A platform connection: feeds inbound events and exposes an outbound.
#[async_trait]
pub trait ChannelPlugin: Send + Sync {
    fn platform(&self) -> Platform;

    /// Connect using the plugin's JSON account config and start pushing
    /// inbound messages onto `events`.
    async fn start(&mut self, config: serde_json::Value, events: EventSender) -> Result<()>;

    /// Disconnect. Idempotent.
    async fn stop(&mut self) -> Result<()>;

    /// Outbound adapter; usable before `start` only for building the relay.
    fn outbound(&self) -> Arc<dyn ChannelOutbound>;
}
