use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::all::{
        Channel, ChannelId, ChannelType, CreateMessage, Http, MessageId, MessageReference,
    },
    tracing::debug,
};

use chatbridge_channels::{
    ChannelKind, ChannelMetadata, ChannelOutbound, Error, Platform, Result,
};

use crate::state::SharedState;

/// Outbound message sender for Discord.
pub struct DiscordOutbound {
    pub(crate) state: SharedState,
}

impl DiscordOutbound {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn get_http(&self) -> Result<Arc<Http>> {
        self.state
            .http()
            .ok_or_else(|| Error::unavailable("discord client is not started"))
    }
}

/// Parse a snowflake id. Zero is not a valid snowflake.
fn parse_snowflake(id: &str) -> Option<u64> {
    id.trim().parse::<u64>().ok().filter(|n| *n != 0)
}

fn parse_channel_id(id: &str) -> Result<ChannelId> {
    parse_snowflake(id)
        .map(ChannelId::new)
        .ok_or_else(|| Error::invalid_input(format!("not a discord channel id: {id:?}")))
}

/// Reply reference that does not fail the send when the target is gone.
fn reply_reference(channel: ChannelId, reply_to: Option<&str>) -> Option<MessageReference> {
    let message = parse_snowflake(reply_to?)?;
    let mut reference = MessageReference::from((channel, MessageId::new(message)));
    reference.fail_if_not_exists = Some(false);
    Some(reference)
}

fn classify_channel(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::News => ChannelKind::Broadcast,
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread => {
            ChannelKind::Thread
        },
        ChannelType::Private => ChannelKind::Direct,
        _ => ChannelKind::Other,
    }
}

fn channel_metadata(channel: Channel) -> ChannelMetadata {
    match channel {
        Channel::Guild(guild) => ChannelMetadata {
            id: guild.id.to_string(),
            parent_id: guild.parent_id.map(|p| p.to_string()),
            kind: classify_channel(guild.kind),
            name: guild.name,
        },
        Channel::Private(private) => ChannelMetadata {
            id: private.id.to_string(),
            parent_id: None,
            kind: ChannelKind::Direct,
            name: private.recipient.name,
        },
        other => ChannelMetadata {
            id: other.id().to_string(),
            parent_id: None,
            kind: ChannelKind::Other,
            name: other.id().to_string(),
        },
    }
}

#[async_trait]
impl ChannelOutbound for DiscordOutbound {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    async fn send_text(&self, to: &str, text: &str, reply_to: Option<&str>) -> Result<String> {
        let http = self.get_http()?;
        let channel = parse_channel_id(to)?;

        let mut builder = CreateMessage::new().content(text);
        if let Some(reference) = reply_reference(channel, reply_to) {
            builder = builder.reference_message(reference);
        }
        let message = channel
            .send_message(&http, builder)
            .await
            .map_err(|e| Error::send(to, e))?;

        debug!(
            channel_id = to,
            reply_to = ?reply_to,
            message_id = %message.id,
            text_len = text.len(),
            "discord message sent"
        );
        Ok(message.id.to_string())
    }

    async fn lookup_metadata(&self, channel_id: &str) -> Result<ChannelMetadata> {
        let http = self.get_http()?;
        let id = parse_channel_id(channel_id)?;
        let channel = http
            .get_channel(id)
            .await
            .map_err(|e| Error::lookup(channel_id, e))?;
        Ok(channel_metadata(channel))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::state::BotState, rstest::rstest};

    fn outbound() -> DiscordOutbound {
        DiscordOutbound::new(Arc::new(BotState::default()))
    }

    #[rstest]
    #[case("1234567890", Some(1_234_567_890))]
    #[case(" 42 ", Some(42))]
    #[case("0", None)]
    #[case("-5", None)]
    #[case("general", None)]
    fn snowflake_parsing(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_snowflake(input), expected);
    }

    #[test]
    fn reply_reference_tolerates_missing_target() {
        let channel = ChannelId::new(100);
        let reference = reply_reference(channel, Some("7")).unwrap();
        assert_eq!(reference.message_id, Some(MessageId::new(7)));
        assert_eq!(reference.channel_id, channel);
        assert_eq!(reference.fail_if_not_exists, Some(false));

        assert!(reply_reference(channel, Some("abc")).is_none());
        assert!(reply_reference(channel, None).is_none());
    }

    #[rstest]
    #[case(ChannelType::Text, ChannelKind::Text)]
    #[case(ChannelType::PublicThread, ChannelKind::Thread)]
    #[case(ChannelType::PrivateThread, ChannelKind::Thread)]
    #[case(ChannelType::News, ChannelKind::Broadcast)]
    #[case(ChannelType::Private, ChannelKind::Direct)]
    #[case(ChannelType::Voice, ChannelKind::Other)]
    fn channel_kinds(#[case] kind: ChannelType, #[case] expected: ChannelKind) {
        assert_eq!(classify_channel(kind), expected);
    }

    #[tokio::test]
    async fn send_before_start_is_unavailable() {
        let err = outbound().send_text("100", "hi", None).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }

    #[tokio::test]
    async fn lookup_before_start_is_unavailable() {
        let err = outbound().lookup_metadata("100").await.unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }
}
