use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use {
    chatbridge_channels::ChannelMetadata,
    teloxide::{Bot, types::UserId},
    tokio_util::sync::CancellationToken,
};

/// Shared bot state.
pub type SharedState = Arc<BotState>;

/// A connected bot and the token that stops its polling loop.
#[derive(Clone)]
pub struct Connection {
    pub bot: Bot,
    pub bot_id: UserId,
    pub username: Option<String>,
    pub cancel: CancellationToken,
}

/// Runtime state shared by the polling loop, the plugin and the outbound
/// sender. Locks are never held across `.await` points.
#[derive(Default)]
pub struct BotState {
    connection: RwLock<Option<Connection>>,
    /// Chats seen in updates, keyed by chat id.
    chats: RwLock<HashMap<String, ChannelMetadata>>,
    /// Forum topic names, keyed by `(chat id, thread id)`.
    topics: RwLock<HashMap<(String, String), String>>,
}

impl BotState {
    /// Install a new connection, returning the previous one if any.
    pub fn connect(&self, connection: Connection) -> Option<Connection> {
        self.write_connection().replace(connection)
    }

    pub fn disconnect(&self) -> Option<Connection> {
        self.write_connection().take()
    }

    pub fn is_connected(&self) -> bool {
        self.read_connection().is_some()
    }

    pub fn bot(&self) -> Option<Bot> {
        self.read_connection().as_ref().map(|c| c.bot.clone())
    }

    /// Id of the connected bot account.
    pub fn bot_id(&self) -> Option<UserId> {
        self.read_connection().as_ref().map(|c| c.bot_id)
    }

    pub fn remember_chat(&self, meta: ChannelMetadata) {
        self.chats
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(meta.id.clone(), meta);
    }

    pub fn chat(&self, chat_id: &str) -> Option<ChannelMetadata> {
        self.chats
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(chat_id)
            .cloned()
    }

    pub fn remember_topic(&self, chat_id: &str, thread_id: &str, name: impl Into<String>) {
        self.topics
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((chat_id.to_string(), thread_id.to_string()), name.into());
    }

    pub fn topic(&self, chat_id: &str, thread_id: &str) -> Option<String> {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(chat_id.to_string(), thread_id.to_string()))
            .cloned()
    }

    fn read_connection(&self) -> RwLockReadGuard<'_, Option<Connection>> {
        self.connection.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_connection(&self) -> RwLockWriteGuard<'_, Option<Connection>> {
        self.connection.write().unwrap_or_else(|e| e.into_inner())
    }
}
