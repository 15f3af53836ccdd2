//! Discord event handler for serenity.
//!
//! Implements the EventHandler trait to turn gateway messages into relay
//! events.

use {
    serenity::{
        all::{ChannelId, Context, EventHandler, GatewayIntents, Message, MessageId, Ready},
        async_trait,
    },
    tracing::{debug, info, warn},
};

use chatbridge_channels::{EventSender, MessageEvent, Platform};

use crate::state::SharedState;

/// Author fields carried into a relay event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub username: String,
    /// Account-wide display name.
    pub global_name: Option<String>,
    /// Guild nickname.
    pub nickname: Option<String>,
    pub is_bot: bool,
}

impl Author {
    fn of(msg: &Message) -> Self {
        Self {
            username: msg.author.name.clone(),
            global_name: msg.author.global_name.clone(),
            nickname: msg.member.as_ref().and_then(|m| m.nick.clone()),
            is_bot: msg.author.bot,
        }
    }
}

/// Build a relay event. Threads are their own channels on Discord, so
/// `channel_id` is the thread id for messages posted in one.
pub fn build_event(
    channel_id: ChannelId,
    message_id: MessageId,
    author: Author,
    content: &str,
    reply_to: Option<MessageId>,
) -> MessageEvent {
    let mut event = MessageEvent::new(
        Platform::Discord,
        channel_id.to_string(),
        message_id.to_string(),
        author.username,
        content,
    );
    event.author_nickname = author.nickname.filter(|n| !n.trim().is_empty());
    event.author_global_name = author.global_name.filter(|n| !n.trim().is_empty());
    event.reply_to_message_id = reply_to.map(|id| id.to_string());
    event.is_self = author.is_bot;
    event
}

/// Handler for Discord gateway events.
///
/// Serenity dispatches each gateway event on its own task, so messages that
/// arrive close together may reach the relay queue out of order. Ordering is
/// only guaranteed from the queue onward.
pub struct DiscordHandler {
    pub state: SharedState,
    pub events: EventSender,
}

impl DiscordHandler {
    pub fn new(state: SharedState, events: EventSender) -> Self {
        Self { state, events }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        self.state.set_bot_user_id(ready.user.id);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let mut author = Author::of(&msg);
        // Our own relayed posts, even if the bot flag were missing.
        if self.state.bot_user_id() == Some(msg.author.id) {
            author.is_bot = true;
        }

        let reply_to = msg.message_reference.as_ref().and_then(|r| r.message_id);
        let event = build_event(msg.channel_id, msg.id, author, &msg.content, reply_to);

        debug!(
            channel_id = %event.channel_id,
            message_id = %event.message_id,
            guild_id = ?msg.guild_id.map(|g| g.get()),
            reply_to = ?event.reply_to_message_id,
            is_self = event.is_self,
            "queueing discord message"
        );
        if self.events.send(event).await.is_err() {
            warn!("relay event queue closed, dropping discord message");
        }
    }
}
