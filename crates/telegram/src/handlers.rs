use {
    chatbridge_channels::{
        ChannelKind, ChannelMetadata, Error, EventSender, MessageEvent, Platform, Result,
    },
    teloxide::types::{Chat, ChatKind, MediaKind, Message, MessageKind, PublicChatKind},
    tracing::debug,
};

use crate::state::BotState;

/// Handle a single inbound Telegram message (called from the polling loop).
///
/// Remembers the chat and any forum topic name for metadata lookups and
/// queues a relay event when the message carries text. Fails only when the
/// relay queue is closed.
pub async fn handle_message(msg: &Message, state: &BotState, events: &EventSender) -> Result<()> {
    let chat_id = msg.chat.id.0.to_string();
    state.remember_chat(chat_metadata(&msg.chat));
    if let Some((thread_id, name)) = topic_created(msg) {
        state.remember_topic(&chat_id, &thread_id, name);
    }

    let Some(mut event) = to_event(msg) else {
        debug!(
            chat_id = msg.chat.id.0,
            message_id = msg.id.0,
            "ignoring telegram message without text"
        );
        return Ok(());
    };
    if let Some(thread_id) = &event.thread_id {
        event.thread_name = state.topic(&chat_id, thread_id);
    }
    // Our own posts, even if the bot flag were missing.
    if msg
        .from
        .as_ref()
        .is_some_and(|user| state.bot_id() == Some(user.id))
    {
        event.is_self = true;
    }

    debug!(
        chat_id = %event.channel_id,
        message_id = %event.message_id,
        thread_id = ?event.thread_id,
        reply_to = ?event.reply_to_message_id,
        is_self = event.is_self,
        "queueing telegram message"
    );
    events
        .send(event)
        .await
        .map_err(|_| Error::unavailable("relay event queue closed"))
}

/// Convert a Telegram message into a relay event. `None` when there is no
/// text or caption to relay.
pub fn to_event(msg: &Message) -> Option<MessageEvent> {
    let text = extract_text(msg)?;

    let (username, full_name, is_bot) = match msg.from.as_ref() {
        Some(user) => {
            let full_name = user.full_name().trim().to_string();
            let username = user
                .username
                .clone()
                .unwrap_or_else(|| user.first_name.clone());
            (username, Some(full_name).filter(|n| !n.is_empty()), user.is_bot)
        },
        // Channel posts have no sender user.
        None => (chat_name(&msg.chat), None, false),
    };

    let mut event = MessageEvent::new(
        Platform::Telegram,
        msg.chat.id.0.to_string(),
        msg.id.0.to_string(),
        username,
        text,
    );
    if let Some(name) = full_name {
        event = event.with_global_name(name);
    }
    event.thread_id = msg.thread_id.map(|t| t.0.0.to_string());
    event.reply_to_message_id = reply_target(msg);
    event.is_self = is_bot;
    Some(event)
}

/// Metadata for a chat. Telegram chats never have a parent.
pub fn chat_metadata(chat: &Chat) -> ChannelMetadata {
    ChannelMetadata {
        id: chat.id.0.to_string(),
        parent_id: None,
        kind: classify_chat(chat),
        name: chat_name(chat),
    }
}

/// Extract text content from a message.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            MediaKind::Photo(p) => p.caption.clone(),
            MediaKind::Document(d) => d.caption.clone(),
            MediaKind::Audio(a) => a.caption.clone(),
            MediaKind::Voice(v) => v.caption.clone(),
            MediaKind::Video(vid) => vid.caption.clone(),
            MediaKind::Animation(a) => a.caption.clone(),
            _ => None,
        },
        _ => None,
    }
}

/// Id of the message this one replies to.
///
/// Every message in a forum topic implicitly replies to the topic's root
/// message; that is not a user reply.
fn reply_target(msg: &Message) -> Option<String> {
    let reply = msg.reply_to_message()?;
    if msg.thread_id.is_some_and(|t| t.0 == reply.id) {
        return None;
    }
    Some(reply.id.0.to_string())
}

/// `(thread id, name)` of a forum topic announced by `msg` itself or by the
/// topic root it implicitly replies to.
fn topic_created(msg: &Message) -> Option<(String, String)> {
    let root = match &msg.kind {
        MessageKind::ForumTopicCreated(_) => msg,
        _ => msg.reply_to_message()?,
    };
    let MessageKind::ForumTopicCreated(created) = &root.kind else {
        return None;
    };
    Some((
        root.id.0.to_string(),
        created.forum_topic_created.name.clone(),
    ))
}

fn classify_chat(chat: &Chat) -> ChannelKind {
    match &chat.kind {
        ChatKind::Private(_) => ChannelKind::Direct,
        ChatKind::Public(p) => match p.kind {
            PublicChatKind::Channel(_) => ChannelKind::Broadcast,
            _ => ChannelKind::Group,
        },
    }
}

fn chat_name(chat: &Chat) -> String {
    chat.title()
        .or_else(|| chat.username())
        .or_else(|| chat.first_name())
        .map(str::to_string)
        .unwrap_or_else(|| chat.id.0.to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::state::Connection,
        chatbridge_channels::event_channel,
        serde_json::json,
        teloxide::types::UserId,
        tokio_util::sync::CancellationToken,
    };

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("deserialize telegram message")
    }

    fn group_text(text: &str) -> serde_json::Value {
        json!({
            "message_id": 10,
            "date": 1,
            "chat": { "id": -1001, "type": "supergroup", "title": "Team" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "last_name": "Smith",
                "username": "alice"
            },
            "text": text
        })
    }

    #[test]
    fn text_message_becomes_event() {
        let ev = to_event(&message(group_text("hello"))).unwrap();
        assert_eq!(ev.platform, Platform::Telegram);
        assert_eq!(ev.channel_id, "-1001");
        assert_eq!(ev.message_id, "10");
        assert_eq!(ev.author_username, "alice");
        assert_eq!(ev.author_global_name.as_deref(), Some("Alice Smith"));
        assert_eq!(ev.author_nickname, None);
        assert_eq!(ev.text, "hello");
        assert_eq!(ev.reply_to_message_id, None);
        assert!(!ev.is_self);
    }

    #[test]
    fn username_falls_back_to_first_name() {
        let msg = message(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Bob" },
            "from": { "id": 7, "is_bot": false, "first_name": "Bob" },
            "text": "hi"
        }));
        let ev = to_event(&msg).unwrap();
        assert_eq!(ev.author_username, "Bob");
        assert_eq!(ev.author_global_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn bot_senders_are_flagged() {
        let mut value = group_text("relayed");
        value["from"]["is_bot"] = json!(true);
        assert!(to_event(&message(value)).unwrap().is_self);
    }

    #[test]
    fn caption_is_used_for_media() {
        let msg = message(json!({
            "message_id": 2,
            "date": 1,
            "chat": { "id": -1001, "type": "supergroup", "title": "Team" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 1,
                "height": 1
            }],
            "caption": "look"
        }));
        assert_eq!(to_event(&msg).unwrap().text, "look");
    }

    #[test]
    fn media_without_caption_is_skipped() {
        let msg = message(json!({
            "message_id": 3,
            "date": 1,
            "chat": { "id": -1001, "type": "supergroup", "title": "Team" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "location": { "latitude": 48.8566, "longitude": 2.3522 }
        }));
        assert!(to_event(&msg).is_none());
    }

    #[test]
    fn reply_carries_target_id() {
        let mut value = group_text("answer");
        value["reply_to_message"] = json!({
            "message_id": 5,
            "date": 1,
            "chat": { "id": -1001, "type": "supergroup", "title": "Team" },
            "text": "question"
        });
        let ev = to_event(&message(value)).unwrap();
        assert_eq!(ev.reply_to_message_id.as_deref(), Some("5"));
    }

    #[test]
    fn forum_topic_root_is_not_a_reply() {
        let mut value = group_text("in topic");
        value["message_thread_id"] = json!(7);
        value["is_topic_message"] = json!(true);
        value["reply_to_message"] = json!({
            "message_id": 7,
            "date": 1,
            "chat": { "id": -1001, "type": "supergroup", "title": "Team" },
            "text": "topic root"
        });
        let ev = to_event(&message(value)).unwrap();
        assert_eq!(ev.thread_id.as_deref(), Some("7"));
        assert_eq!(ev.reply_to_message_id, None);
    }

    #[test]
    fn chat_kinds() {
        let private = message(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Bob" },
            "text": "x"
        }));
        assert_eq!(chat_metadata(&private.chat).kind, ChannelKind::Direct);
        assert_eq!(chat_metadata(&private.chat).name, "Bob");

        let channel = message(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": -1002, "type": "channel", "title": "News" },
            "text": "x"
        }));
        let meta = chat_metadata(&channel.chat);
        assert_eq!(meta.kind, ChannelKind::Broadcast);
        assert_eq!(meta.name, "News");
        assert_eq!(meta.parent_id, None);
    }

    #[tokio::test]
    async fn handle_message_queues_event_and_caches_chat() {
        let state = BotState::default();
        let (tx, mut rx) = event_channel(4);

        handle_message(&message(group_text("hello")), &state, &tx)
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().text, "hello");
        assert_eq!(state.chat("-1001").unwrap().name, "Team");
    }

    fn topic_root() -> serde_json::Value {
        json!({
            "message_id": 7,
            "message_thread_id": 7,
            "date": 1,
            "chat": { "id": -1001, "type": "supergroup", "title": "Team", "is_forum": true },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "forum_topic_created": { "name": "releases", "icon_color": 7322096 }
        })
    }

    fn topic_text(id: i32, text: &str) -> serde_json::Value {
        let mut value = group_text(text);
        value["message_id"] = json!(id);
        value["message_thread_id"] = json!(7);
        value["is_topic_message"] = json!(true);
        value
    }

    #[tokio::test]
    async fn topic_messages_carry_topic_name() {
        let state = BotState::default();
        let (tx, mut rx) = event_channel(4);

        let mut first = topic_text(11, "shipped");
        first["reply_to_message"] = topic_root();
        handle_message(&message(first), &state, &tx).await.unwrap();
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.thread_id.as_deref(), Some("7"));
        assert_eq!(ev.thread_name.as_deref(), Some("releases"));
        assert_eq!(ev.reply_to_message_id, None);

        // Later replies inside the topic no longer include the root.
        let mut reply = topic_text(12, "nice");
        reply["reply_to_message"] = topic_text(11, "shipped");
        handle_message(&message(reply), &state, &tx).await.unwrap();
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.thread_name.as_deref(), Some("releases"));
        assert_eq!(ev.reply_to_message_id.as_deref(), Some("11"));
    }

    #[tokio::test]
    async fn unknown_topic_has_no_name() {
        let state = BotState::default();
        let (tx, mut rx) = event_channel(4);

        handle_message(&message(topic_text(11, "hi")), &state, &tx)
            .await
            .unwrap();
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.thread_id.as_deref(), Some("7"));
        assert_eq!(ev.thread_name, None);
    }

    #[tokio::test]
    async fn own_bot_account_is_flagged() {
        let state = BotState::default();
        state.connect(Connection {
            bot: teloxide::Bot::new("test:fake_token_for_unit_tests"),
            bot_id: UserId(1001),
            username: Some("bridge_bot".into()),
            cancel: CancellationToken::new(),
        });
        let (tx, mut rx) = event_channel(4);

        // Flag missing, but the sender is the connected bot account.
        handle_message(&message(group_text("relayed")), &state, &tx)
            .await
            .unwrap();
        assert!(rx.recv().await.unwrap().is_self);
    }

    #[tokio::test]
    async fn handle_message_fails_when_queue_closed() {
        let state = BotState::default();
        let (tx, rx) = event_channel(1);
        drop(rx);

        let err = handle_message(&message(group_text("hello")), &state, &tx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }
}
