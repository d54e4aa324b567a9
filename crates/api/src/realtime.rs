//! Realtime channel registry.
//!
//! Every WebSocket connection belongs to exactly one verified user and is a
//! member of that user's room. A room is addressed by user ID; pushing to a
//! room reaches every live connection of that user (several tabs or
//! devices). Outbound frames travel through unbounded per-connection
//! channels, so a broadcast never waits on a slow socket.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use recipebox_common::{AppError, AppResult};
use recipebox_core::{EventPublisher, StreamEvent};
use serde_json::json;
use tokio::sync::{RwLock, mpsc};

/// Opaque handle for a registered connection.
pub type ConnectionId = u64;

struct Connection {
    user_id: i64,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct Rooms {
    connections: HashMap<ConnectionId, Connection>,
    members: HashMap<i64, HashSet<ConnectionId>>,
}

impl Rooms {
    fn remove_member(&mut self, user_id: i64, connection: ConnectionId) {
        if let Some(room) = self.members.get_mut(&user_id) {
            room.remove(&connection);
            if room.is_empty() {
                self.members.remove(&user_id);
            }
        }
    }
}

/// Registry of live connections and per-user rooms.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    rooms: Arc<RwLock<Rooms>>,
    next_id: Arc<AtomicU64>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user verified during the handshake and
    /// place it in that user's room.
    ///
    /// Returns the connection handle and the receiving end of its outbound
    /// frame channel.
    pub async fn connect(
        &self,
        user_id: i64,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut rooms = self.rooms.write().await;
        rooms.connections.insert(id, Connection { user_id, sender });
        rooms.members.entry(user_id).or_default().insert(id);
        drop(rooms);

        tracing::debug!(connection = id, user_id, "Connection registered");
        (id, receiver)
    }

    /// Join `user_id`'s room. Only the connection's own room may be joined.
    pub async fn join(&self, connection: ConnectionId, user_id: i64) -> AppResult<()> {
        let mut rooms = self.rooms.write().await;

        let owner = rooms
            .connections
            .get(&connection)
            .map(|c| c.user_id)
            .ok_or_else(|| AppError::NotFound(format!("Connection {connection}")))?;

        if owner != user_id {
            tracing::warn!(
                connection,
                owner,
                requested = user_id,
                "Rejected join of a foreign room"
            );
            return Err(AppError::Forbidden(
                "Cannot join another user's room".to_string(),
            ));
        }

        rooms.members.entry(user_id).or_default().insert(connection);
        Ok(())
    }

    /// Leave `user_id`'s room. Leaving a room the connection is not in is a
    /// no-op.
    pub async fn leave(&self, connection: ConnectionId, user_id: i64) {
        self.rooms.write().await.remove_member(user_id, connection);
    }

    /// Push one frame to every connection in `user_id`'s room.
    ///
    /// Returns the number of connections reached; an empty room is a no-op.
    pub async fn broadcast(&self, user_id: i64, event: &str, payload: serde_json::Value) -> usize {
        let frame = json!({ "type": event, "body": payload }).to_string();

        let rooms = self.rooms.read().await;
        let Some(members) = rooms.members.get(&user_id) else {
            return 0;
        };

        members
            .iter()
            .filter_map(|id| rooms.connections.get(id))
            .filter(|connection| connection.sender.send(frame.clone()).is_ok())
            .count()
    }

    /// Remove a connection from the registry and from every room.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        if let Some(removed) = rooms.connections.remove(&connection) {
            rooms.remove_member(removed.user_id, connection);
            tracing::debug!(connection, user_id = removed.user_id, "Connection closed");
        }
    }

    /// Number of connections currently in `user_id`'s room.
    pub async fn room_size(&self, user_id: i64) -> usize {
        self.rooms
            .read()
            .await
            .members
            .get(&user_id)
            .map_or(0, HashSet::len)
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.rooms.read().await.connections.len()
    }
}

#[async_trait]
impl EventPublisher for ChannelRegistry {
    async fn publish_to_user(
        &self,
        user_id: i64,
        event: StreamEvent,
        payload: serde_json::Value,
    ) -> AppResult<usize> {
        Ok(self.broadcast(user_id, event.as_str(), payload).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_joins_own_room() {
        let registry = ChannelRegistry::new();
        let (_conn, _rx) = registry.connect(7).await;

        assert_eq!(registry.room_size(7).await, 1);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_connection_of_user() {
        let registry = ChannelRegistry::new();
        let (_a, mut rx_a) = registry.connect(7).await;
        let (_b, mut rx_b) = registry.connect(7).await;
        let (_c, mut rx_c) = registry.connect(8).await;

        let reached = registry
            .broadcast(7, "notificationCreated", json!({ "id": 1 }))
            .await;

        assert_eq!(reached, 2);
        let frame: serde_json::Value = serde_json::from_str(&rx_a.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "notificationCreated");
        assert_eq!(frame["body"]["id"], 1);
        assert!(rx_b.recv().await.is_some());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_room_is_noop() {
        let registry = ChannelRegistry::new();
        assert_eq!(registry.broadcast(42, "newNotification", json!([])).await, 0);
    }

    #[tokio::test]
    async fn test_join_foreign_room_is_forbidden() {
        let registry = ChannelRegistry::new();
        let (conn, _rx) = registry.connect(1).await;

        let result = registry.join(conn, 2).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(registry.room_size(2).await, 0);
    }

    #[tokio::test]
    async fn test_leave_then_rejoin_own_room() {
        let registry = ChannelRegistry::new();
        let (conn, _rx) = registry.connect(1).await;

        registry.leave(conn, 1).await;
        assert_eq!(registry.room_size(1).await, 0);
        assert_eq!(registry.broadcast(1, "newNotification", json!([])).await, 0);

        registry.join(conn, 1).await.unwrap();
        assert_eq!(registry.room_size(1).await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_removes_from_rooms() {
        let registry = ChannelRegistry::new();
        let (conn, _rx) = registry.connect(1).await;

        registry.disconnect(conn).await;

        assert_eq!(registry.room_size(1).await, 0);
        assert_eq!(registry.connection_count().await, 0);
        assert!(matches!(
            registry.join(conn, 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_not_counted() {
        let registry = ChannelRegistry::new();
        let (_conn, rx) = registry.connect(1).await;
        drop(rx);

        assert_eq!(registry.broadcast(1, "newNotification", json!([])).await, 0);
    }

    #[tokio::test]
    async fn test_publisher_uses_event_name() {
        let registry = ChannelRegistry::new();
        let (_conn, mut rx) = registry.connect(3).await;

        let reached = registry
            .publish_to_user(3, StreamEvent::NewNotification, json!([]))
            .await
            .unwrap();

        assert_eq!(reached, 1);
        assert!(rx.recv().await.unwrap().contains("\"newNotification\""));
    }
}
