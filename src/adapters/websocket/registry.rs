//! Connection registry: the live set, event dispatch and room broadcast.
//!
//! The registry is the single owner of connection membership. All
//! mutations of the live set happen under its write lock, so registration
//! and removal are linearizable; broadcasts take the read lock only long
//! enough to snapshot the matching members.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::application::handlers;
use crate::domain::{DispatchError, Envelope, EventKind};

use super::connection::{Connection, ConnectionId};

/// Registry of live connections.
///
/// A connection is a member iff both of its pumps are running (or about to
/// start); every pump exit path funnels into [`Registry::deregister`].
pub struct Registry {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to the live set. Called before its pumps start.
    pub async fn register(&self, conn: Arc<Connection>) {
        let mut connections = self.connections.write().await;
        connections.insert(conn.id(), conn);
    }

    /// Remove a connection from the live set and tear its transport down.
    ///
    /// Idempotent: both pumps call this on exit and only the first call
    /// does anything. Cancelling the connection wakes whichever pump is
    /// still running (and any broadcaster blocked on its egress queue).
    pub async fn deregister(&self, id: ConnectionId) {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&id)
        };

        if let Some(conn) = removed {
            conn.cancel();
            tracing::info!(connection_id = %id, "connection deregistered");
        }
    }

    /// Dispatch one inbound event on the calling task (the source
    /// connection's read pump).
    ///
    /// `new_message` is server-originated only, so receiving it from a
    /// client is treated the same as an unregistered type.
    pub async fn dispatch(
        &self,
        envelope: &Envelope,
        source: &Arc<Connection>,
    ) -> Result<(), DispatchError> {
        match EventKind::parse(&envelope.kind)? {
            EventKind::SendMessage => handlers::send_message(self, source, envelope).await,
            EventKind::ChangeRoom => handlers::change_room(source, envelope).await,
            EventKind::NewMessage => Err(DispatchError::UnknownEventType {
                kind: envelope.kind.clone(),
            }),
        }
    }

    /// Enqueue an event onto every live connection tagged with `room`.
    ///
    /// Members are snapshotted under the read lock, then sent to without
    /// it: a consumer with a full egress queue stalls the broadcaster (the
    /// documented backpressure choice) but never blocks membership changes.
    pub async fn broadcast_to_room(&self, room: &str, event: Envelope) {
        let members = {
            let connections = self.connections.read().await;
            let mut members = Vec::new();
            for conn in connections.values() {
                if conn.room().await == room {
                    members.push(conn.clone());
                }
            }
            members
        };

        for member in members {
            if member.enqueue(event.clone()).await.is_err() {
                // Receiver already torn down; its pumps will deregister it.
                tracing::debug!(connection_id = %member.id(), "skipping closed egress queue");
            }
        }
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Deregister every live connection. Used on graceful shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections.keys().copied().collect()
        };
        for id in ids {
            self.deregister(id).await;
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, SendMessagePayload};
    use serde_json::value::RawValue;

    fn send_message_envelope(message: &str, from: &str) -> Envelope {
        Envelope::new(
            EventKind::SendMessage,
            &SendMessagePayload {
                message: message.to_string(),
                from: from.to_string(),
            },
        )
        .unwrap()
    }

    fn unknown_envelope() -> Envelope {
        Envelope {
            kind: "no_such_type".to_string(),
            payload: RawValue::from_string("{}".to_string()).unwrap(),
        }
    }

    #[tokio::test]
    async fn register_and_deregister_track_live_count() {
        let registry = Arc::new(Registry::new());
        let (conn_a, _rx_a) = Connection::new(1);
        let (conn_b, _rx_b) = Connection::new(1);

        registry.register(conn_a.clone()).await;
        registry.register(conn_b.clone()).await;
        assert_eq!(registry.connection_count().await, 2);

        registry.deregister(conn_a.id()).await;
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn deregister_is_idempotent() {
        let registry = Arc::new(Registry::new());
        let (conn, _rx) = Connection::new(1);

        registry.register(conn.clone()).await;
        registry.deregister(conn.id()).await;
        registry.deregister(conn.id()).await;

        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn deregister_cancels_the_connection() {
        let registry = Arc::new(Registry::new());
        let (conn, _rx) = Connection::new(1);

        registry.register(conn.clone()).await;
        registry.deregister(conn.id()).await;

        // Must complete immediately after deregistration.
        conn.cancelled().await;
    }

    #[tokio::test]
    async fn dispatch_unknown_type_errors_and_leaves_registry_intact() {
        let registry = Arc::new(Registry::new());
        let (conn, _rx) = Connection::new(1);
        registry.register(conn.clone()).await;

        let err = registry.dispatch(&unknown_envelope(), &conn).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownEventType { .. }));
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn inbound_new_message_is_rejected() {
        let registry = Arc::new(Registry::new());
        let (conn, _rx) = Connection::new(1);
        registry.register(conn.clone()).await;

        let envelope = Envelope {
            kind: "new_message".to_string(),
            payload: RawValue::from_string("{}".to_string()).unwrap(),
        };
        let err = registry.dispatch(&envelope, &conn).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownEventType { .. }));
    }

    #[tokio::test]
    async fn broadcast_reaches_only_matching_room() {
        let registry = Arc::new(Registry::new());
        let (conn_a, mut rx_a) = Connection::new(8);
        let (conn_b, mut rx_b) = Connection::new(8);
        let (conn_c, mut rx_c) = Connection::new(8);

        conn_a.set_room("room1".to_string()).await;
        conn_c.set_room("room1".to_string()).await;

        registry.register(conn_a.clone()).await;
        registry.register(conn_b.clone()).await;
        registry.register(conn_c.clone()).await;

        registry
            .broadcast_to_room("room1", send_message_envelope("hi", "alice"))
            .await;

        assert_eq!(rx_a.recv().await.unwrap().kind, "send_message");
        assert_eq!(rx_c.recv().await.unwrap().kind, "send_message");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_to_empty_room_is_noop() {
        let registry = Arc::new(Registry::new());
        registry
            .broadcast_to_room("nowhere", send_message_envelope("hi", "alice"))
            .await;
    }

    #[tokio::test]
    async fn broadcast_skips_closed_egress_queues() {
        let registry = Arc::new(Registry::new());
        let (conn, rx) = Connection::new(1);
        registry.register(conn.clone()).await;
        drop(rx);

        // Must not error or hang.
        registry
            .broadcast_to_room("", send_message_envelope("hi", "alice"))
            .await;
    }

    #[tokio::test]
    async fn close_all_empties_the_live_set() {
        let registry = Arc::new(Registry::new());
        let (conn_a, _rx_a) = Connection::new(1);
        let (conn_b, _rx_b) = Connection::new(1);
        registry.register(conn_a).await;
        registry.register(conn_b).await;

        registry.close_all().await;
        assert_eq!(registry.connection_count().await, 0);
    }
}
