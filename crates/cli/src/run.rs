use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, Result, bail},
    chatbridge_channels::{ChannelPlugin, event_channel},
    chatbridge_config::{BindingStore, BridgeConfig},
    chatbridge_discord::{DiscordAccountConfig, DiscordPlugin},
    chatbridge_relay::{Bridge, Endpoint},
    chatbridge_telegram::{TelegramAccountConfig, TelegramPlugin},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

/// Connect both platforms and relay until Ctrl-C.
pub async fn run_bridge(config: BridgeConfig, binding_file: PathBuf) -> Result<()> {
    let discord_cfg: DiscordAccountConfig = serde_json::from_value(config.discord.clone())
        .context("invalid [discord] config section")?;
    let telegram_cfg: TelegramAccountConfig = serde_json::from_value(config.telegram.clone())
        .context("invalid [telegram] config section")?;
    if !discord_cfg.has_token() {
        bail!("discord token missing: set DISCORD_TOKEN or discord.token");
    }
    if !telegram_cfg.has_token() {
        bail!("telegram token missing: set TELEGRAM_TOKEN or telegram.token");
    }

    let bindings = Arc::new(BindingStore::open(&binding_file).with_context(|| {
        format!("failed to open binding document {}", binding_file.display())
    })?);
    info!(
        path = %bindings.path().display(),
        state = %bindings.state(),
        "binding loaded"
    );

    let mut discord = DiscordPlugin::new();
    let mut telegram = TelegramPlugin::new();

    let bridge = Bridge::new(
        Arc::clone(&bindings),
        &config.relay,
        Endpoint::new(discord.outbound(), discord_cfg.bind_command.clone()),
        Endpoint::new(telegram.outbound(), telegram_cfg.bind_command.clone()),
    );

    let (discord_tx, discord_rx) = event_channel(config.relay.event_buffer);
    let (telegram_tx, telegram_rx) = event_channel(config.relay.event_buffer);
    let cancel = CancellationToken::new();
    let (source_task, dest_task) = bridge.spawn(discord_rx, telegram_rx, cancel.clone());

    discord
        .start(config.discord, discord_tx)
        .await
        .context("failed to start discord")?;
    if let Err(e) = telegram.start(config.telegram, telegram_tx).await {
        stop_plugin(&mut discord).await;
        return Err(e).context("failed to start telegram");
    }

    info!("bridge running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down");
    cancel.cancel();
    stop_plugin(&mut discord).await;
    stop_plugin(&mut telegram).await;
    for (name, task) in [("source", source_task), ("destination", dest_task)] {
        if let Err(e) = task.await {
            warn!(direction = name, error = %e, "relay task ended abnormally");
        }
    }
    info!(state = %bindings.state(), "chatbridge stopped");
    Ok(())
}

async fn stop_plugin(plugin: &mut dyn ChannelPlugin) {
    let platform = plugin.platform();
    if let Err(e) = plugin.stop().await {
        warn!(%platform, error = %e, "failed to stop channel plugin");
    }
}
