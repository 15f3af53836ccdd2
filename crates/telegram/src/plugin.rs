use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{info, warn},
};

use chatbridge_channels::{ChannelOutbound, ChannelPlugin, Error, EventSender, Platform, Result};

use crate::{
    bot, config::TelegramAccountConfig, outbound::TelegramOutbound, state::SharedState,
};

/// Telegram channel plugin.
pub struct TelegramPlugin {
    state: SharedState,
    outbound: Arc<TelegramOutbound>,
}

impl TelegramPlugin {
    pub fn new() -> Self {
        let state = SharedState::default();
        let outbound = Arc::new(TelegramOutbound::new(Arc::clone(&state)));
        Self { state, outbound }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_connected()
    }
}

impl Default for TelegramPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelPlugin for TelegramPlugin {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn start(&mut self, config: serde_json::Value, events: EventSender) -> Result<()> {
        let tg_config: TelegramAccountConfig = serde_json::from_value(config)?;

        if !tg_config.has_token() {
            return Err(Error::invalid_input("telegram bot token is required"));
        }
        if self.is_running() {
            return Err(Error::unavailable("telegram bot is already started"));
        }

        info!(
            bind_command = %tg_config.bind_command,
            poll_timeout_secs = tg_config.poll_timeout_secs,
            "starting telegram bot"
        );
        bot::start_polling(&tg_config, Arc::clone(&self.state), events).await?;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        match self.state.disconnect() {
            Some(connection) => {
                info!(username = ?connection.username, "stopping telegram bot");
                connection.cancel.cancel();
            },
            None => warn!("telegram bot not running"),
        }
        Ok(())
    }

    fn outbound(&self) -> Arc<dyn ChannelOutbound> {
        Arc::clone(&self.outbound) as Arc<dyn ChannelOutbound>
    }
}
