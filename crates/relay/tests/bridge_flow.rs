#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Both relay directions running as tasks, driven through event queues.

mod common;

use std::{sync::Arc, time::Duration};

use {
    chatbridge_channels::{MessageEvent, Platform, event_channel},
    chatbridge_config::{BindingState, RelayConfig},
    chatbridge_relay::{Bridge, Endpoint, Side, SourceKey},
    tokio_util::sync::CancellationToken,
};

use common::{RecordingOutbound, temp_store};

/// Poll `cond` until it holds or a second has passed.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn handshake_then_relay_and_reply_both_ways() {
    let (_dir, store) = temp_store();
    let discord = RecordingOutbound::new(Platform::Discord, 9000);
    // The bind acknowledgement consumes 41, so the first relayed message is 42.
    let telegram = RecordingOutbound::new(Platform::Telegram, 41);

    let bridge = Bridge::new(
        Arc::clone(&store),
        &RelayConfig::default(),
        Endpoint::new(discord.clone(), "/syn"),
        Endpoint::new(telegram.clone(), "/ack"),
    );

    let (discord_tx, discord_rx) = event_channel(16);
    let (telegram_tx, telegram_rx) = event_channel(16);
    let cancel = CancellationToken::new();
    let (source_task, dest_task) = bridge.spawn(discord_rx, telegram_rx, cancel.clone());

    // Ack #1: source side bound.
    discord_tx
        .send(MessageEvent::new(Platform::Discord, "100", "d1", "admin", "/syn"))
        .await
        .unwrap();
    wait_until(|| discord.sent().len() == 1).await;
    assert_eq!(store.state(), BindingState::SourceBound);
    assert_eq!(discord.sent()[0].reply_to.as_deref(), Some("d1"));

    // Ack #2: fully bound.
    telegram_tx
        .send(MessageEvent::new(Platform::Telegram, "555", "t1", "admin", "/ack"))
        .await
        .unwrap();
    wait_until(|| telegram.sent().len() == 1).await;
    assert_eq!(store.state(), BindingState::FullyBound);
    assert!(telegram.sent()[0].text.contains("Relay is active"));

    // Relay Bob's message.
    discord_tx
        .send(MessageEvent::new(Platform::Discord, "100", "d2", "Bob", "hi"))
        .await
        .unwrap();
    wait_until(|| telegram.sent().len() == 2).await;
    let relayed = telegram.last();
    assert_eq!(relayed.to, "555");
    assert_eq!(relayed.id, "42");
    assert!(relayed.text.contains("Bob"));
    assert!(relayed.text.contains("hi"));

    let table = bridge.correlations().outgoing(Side::Source);
    assert_eq!(
        table.resolve_forward(&SourceKey::new("100", "d2")),
        Some(SourceKey::new("555", "42"))
    );
    assert_eq!(
        table.resolve_backward("42"),
        Some(SourceKey::new("100", "d2"))
    );

    // Telegram reply to the relayed copy threads against Bob's original.
    telegram_tx
        .send(
            MessageEvent::new(Platform::Telegram, "555", "t2", "carol", "hello Bob")
                .with_reply_to("42"),
        )
        .await
        .unwrap();
    wait_until(|| discord.sent().len() == 2).await;
    let back = discord.last();
    assert_eq!(back.to, "100");
    assert_eq!(back.reply_to.as_deref(), Some("d2"));

    // Bob replies to Carol's relayed copy; it threads against her original.
    discord_tx
        .send(
            MessageEvent::new(Platform::Discord, "100", "d3", "Bob", "hey Carol")
                .with_reply_to(back.id.clone()),
        )
        .await
        .unwrap();
    wait_until(|| telegram.sent().len() == 3).await;
    assert_eq!(telegram.last().reply_to.as_deref(), Some("t2"));

    cancel.cancel();
    source_task.await.unwrap();
    dest_task.await.unwrap();
}

#[tokio::test]
async fn events_before_handshake_are_not_relayed() {
    let (_dir, store) = temp_store();
    let discord = RecordingOutbound::new(Platform::Discord, 1);
    let telegram = RecordingOutbound::new(Platform::Telegram, 1);
    let bridge = Bridge::new(
        store,
        &RelayConfig::default(),
        Endpoint::new(discord.clone(), "/syn"),
        Endpoint::new(telegram.clone(), "/ack"),
    );

    let (discord_tx, discord_rx) = event_channel(16);
    let (telegram_tx, telegram_rx) = event_channel(16);
    let (source_task, dest_task) =
        bridge.spawn(discord_rx, telegram_rx, CancellationToken::new());

    for i in 0..5 {
        discord_tx
            .send(MessageEvent::new(Platform::Discord, "100", i.to_string(), "Bob", "hi"))
            .await
            .unwrap();
        telegram_tx
            .send(MessageEvent::new(Platform::Telegram, "555", i.to_string(), "bob", "hi"))
            .await
            .unwrap();
    }

    // Closing the queues ends both directions after the backlog drains.
    drop(discord_tx);
    drop(telegram_tx);
    source_task.await.unwrap();
    dest_task.await.unwrap();

    assert!(discord.sent().is_empty());
    assert!(telegram.sent().is_empty());
}

#[tokio::test]
async fn bridge_engines_use_configured_bind_commands() {
    let (_dir, store) = temp_store();
    let bridge = Bridge::new(
        store,
        &RelayConfig::default(),
        Endpoint::new(RecordingOutbound::new(Platform::Discord, 1), "!bridge"),
        Endpoint::new(RecordingOutbound::new(Platform::Telegram, 1), "/link"),
    );
    assert_eq!(bridge.engine(Side::Source).bind_command(), "!bridge");
    assert_eq!(bridge.engine(Side::Destination).bind_command(), "/link");
    assert_eq!(bridge.engine(Side::Destination).side(), Side::Destination);
    assert!(bridge.bindings().snapshot().source_channel_id.is_empty());
}
