use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serenity::all::{Http, ShardManager, UserId};

/// Shared client state.
pub type SharedState = Arc<BotState>;

/// Handles of a running gateway client.
#[derive(Clone)]
pub struct Connection {
    pub http: Arc<Http>,
    pub shard_manager: Arc<ShardManager>,
}

/// Runtime state shared by the gateway handler, the plugin and the outbound
/// sender. Locks are never held across `.await` points.
#[derive(Default)]
pub struct BotState {
    connection: RwLock<Option<Connection>>,
    /// Set once the gateway reports `ready`.
    bot_user_id: RwLock<Option<UserId>>,
}

impl BotState {
    /// Install a new connection, returning the previous one if any.
    pub fn connect(&self, connection: Connection) -> Option<Connection> {
        self.write_connection().replace(connection)
    }

    pub fn disconnect(&self) -> Option<Connection> {
        *self.bot_user_id.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.write_connection().take()
    }

    pub fn is_connected(&self) -> bool {
        self.read_connection().is_some()
    }

    pub fn http(&self) -> Option<Arc<Http>> {
        self.read_connection().as_ref().map(|c| Arc::clone(&c.http))
    }

    pub fn set_bot_user_id(&self, id: UserId) {
        *self.bot_user_id.write().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }

    pub fn bot_user_id(&self) -> Option<UserId> {
        *self.bot_user_id.read().unwrap_or_else(|e| e.into_inner())
    }

    fn read_connection(&self) -> RwLockReadGuard<'_, Option<Connection>> {
        self.connection.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_connection(&self) -> RwLockWriteGuard<'_, Option<Connection>> {
        self.connection.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_user_id_is_cleared_on_disconnect() {
        let state = BotState::default();
        assert!(!state.is_connected());
        assert!(state.http().is_none());

        state.set_bot_user_id(UserId::new(42));
        assert_eq!(state.bot_user_id(), Some(UserId::new(42)));

        assert!(state.disconnect().is_none());
        assert_eq!(state.bot_user_id(), None);
    }
}
