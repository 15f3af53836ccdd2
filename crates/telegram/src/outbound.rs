use {
    async_trait::async_trait,
    teloxide::{
        Bot,
        payloads::SendMessageSetters,
        prelude::Requester,
        types::{ChatId, MessageId, ReplyParameters},
    },
    tracing::debug,
};

use chatbridge_channels::{
    ChannelKind, ChannelMetadata, ChannelOutbound, Error, Platform, Result,
};

use crate::state::SharedState;

/// Outbound message sender for Telegram.
pub struct TelegramOutbound {
    pub(crate) state: SharedState,
}

impl TelegramOutbound {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn get_bot(&self) -> Result<Bot> {
        self.state
            .bot()
            .ok_or_else(|| Error::unavailable("telegram bot is not started"))
    }
}

/// Parse a chat id string into a Telegram `ChatId`.
fn parse_chat_id(to: &str) -> Result<ChatId> {
    to.trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| Error::invalid_input(format!("not a telegram chat id: {to:?}")))
}

/// Parse a platform message ID string into Telegram `ReplyParameters`.
/// Returns `None` if the string is not a valid i32 (Telegram message IDs are i32).
fn parse_reply_params(reply_to: Option<&str>) -> Option<ReplyParameters> {
    reply_to
        .and_then(|id| id.parse::<i32>().ok())
        .map(|id| ReplyParameters::new(MessageId(id)).allow_sending_without_reply())
}

#[async_trait]
impl ChannelOutbound for TelegramOutbound {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn send_text(&self, to: &str, text: &str, reply_to: Option<&str>) -> Result<String> {
        let bot = self.get_bot()?;
        let chat_id = parse_chat_id(to)?;

        // Plain text: no parse mode, so author names and bodies go out verbatim.
        let mut req = bot.send_message(chat_id, text);
        if let Some(rp) = parse_reply_params(reply_to) {
            req = req.reply_parameters(rp);
        }
        let message = req.await.map_err(|e| Error::send(to, e))?;

        debug!(
            chat_id = to,
            reply_to = ?reply_to,
            message_id = message.id.0,
            text_len = text.len(),
            "telegram message sent"
        );
        Ok(message.id.0.to_string())
    }

    /// Answered from chats seen in updates; no Bot API call.
    async fn lookup_metadata(&self, channel_id: &str) -> Result<ChannelMetadata> {
        if let Some(meta) = self.state.chat(channel_id) {
            return Ok(meta);
        }
        parse_chat_id(channel_id)?;
        Ok(ChannelMetadata {
            id: channel_id.to_string(),
            parent_id: None,
            kind: ChannelKind::Other,
            name: channel_id.to_string(),
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::state::BotState,
        rstest::rstest,
        std::sync::Arc,
    };

    fn outbound() -> TelegramOutbound {
        TelegramOutbound::new(Arc::new(BotState::default()))
    }

    #[rstest]
    #[case(Some("42"), Some(42))]
    #[case(Some("-5"), Some(-5))]
    #[case(Some("abc"), None)]
    #[case(Some("99999999999"), None)]
    #[case(None, None)]
    fn reply_params_parsing(#[case] input: Option<&str>, #[case] expected: Option<i32>) {
        let params = parse_reply_params(input);
        assert_eq!(params.as_ref().map(|p| p.message_id.0), expected);
        if let Some(p) = params {
            assert_eq!(p.allow_sending_without_reply, Some(true));
        }
    }

    #[rstest]
    #[case("555", Some(555))]
    #[case(" -1001 ", Some(-1001))]
    #[case("general", None)]
    #[case("", None)]
    fn chat_id_parsing(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_chat_id(input).ok().map(|c| c.0), expected);
    }

    #[tokio::test]
    async fn send_before_start_is_unavailable() {
        let err = outbound().send_text("555", "hi", None).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }

    #[tokio::test]
    async fn lookup_uses_chat_cache() {
        let out = outbound();
        out.state.remember_chat(ChannelMetadata {
            id: "-1001".into(),
            parent_id: None,
            kind: ChannelKind::Group,
            name: "Team".into(),
        });

        let meta = out.lookup_metadata("-1001").await.unwrap();
        assert_eq!(meta.kind, ChannelKind::Group);
        assert_eq!(meta.name, "Team");

        let unknown = out.lookup_metadata("-2002").await.unwrap();
        assert_eq!(unknown.kind, ChannelKind::Other);
        assert_eq!(unknown.parent_id, None);

        assert!(out.lookup_metadata("not-a-chat").await.is_err());
    }
}
