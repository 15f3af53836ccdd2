use std::sync::Arc;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serenity::Client,
    tracing::{error, info, warn},
};

use chatbridge_channels::{ChannelOutbound, ChannelPlugin, Error, EventSender, Platform, Result};

use crate::{
    config::DiscordAccountConfig,
    handler::DiscordHandler,
    outbound::DiscordOutbound,
    state::{Connection, SharedState},
};

/// Discord channel plugin.
pub struct DiscordPlugin {
    state: SharedState,
    outbound: Arc<DiscordOutbound>,
}

impl DiscordPlugin {
    pub fn new() -> Self {
        let state = SharedState::default();
        let outbound = Arc::new(DiscordOutbound::new(Arc::clone(&state)));
        Self { state, outbound }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_connected()
    }
}

impl Default for DiscordPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelPlugin for DiscordPlugin {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    async fn start(&mut self, config: serde_json::Value, events: EventSender) -> Result<()> {
        let dc_config: DiscordAccountConfig = serde_json::from_value(config)?;

        if !dc_config.has_token() {
            return Err(Error::invalid_input("discord bot token is required"));
        }
        if self.is_running() {
            return Err(Error::unavailable("discord client is already started"));
        }

        info!(bind_command = %dc_config.bind_command, "starting discord client");

        let handler = DiscordHandler::new(Arc::clone(&self.state), events);
        let mut client = Client::builder(dc_config.token.expose_secret(), DiscordHandler::intents())
            .event_handler(handler)
            .await
            .map_err(|e| Error::external("build discord client", e))?;

        self.state.connect(Connection {
            http: Arc::clone(&client.http),
            shard_manager: Arc::clone(&client.shard_manager),
        });

        tokio::spawn(async move {
            if let Err(e) = client.start().await {
                error!(error = %e, "discord client stopped with error");
            }
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        match self.state.disconnect() {
            Some(connection) => {
                info!("stopping discord client");
                connection.shard_manager.shutdown_all().await;
            },
            None => warn!("discord client not running"),
        }
        Ok(())
    }

    fn outbound(&self) -> Arc<dyn ChannelOutbound> {
        Arc::clone(&self.outbound) as Arc<dyn ChannelOutbound>
    }
}
