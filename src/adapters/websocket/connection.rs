//! Per-connection state and the read/write pumps.
//!
//! Each accepted WebSocket is split into two halves driven by two
//! independent tasks:
//!
//! - the read pump decodes inbound frames into envelopes and hands them to
//!   the registry for dispatch, enforcing the inbound idle deadline;
//! - the write pump drains the connection's egress queue onto the socket
//!   and emits periodic keepalive probes.
//!
//! Every exit path of either pump converges on the registry's idempotent
//! `deregister`, so a connection never outlives its pumps in the live set.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::Envelope;

use super::registry::Registry;

/// Unique identifier for one WebSocket connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new random connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for one live connection, shared between the registry, the
/// broadcast path and the connection's own pumps.
///
/// The handle owns no socket: the pumps own the two socket halves, which
/// keeps the handle constructible from plain channels in tests.
pub struct Connection {
    id: ConnectionId,
    /// Current room tag, empty string until the client changes room.
    /// Written only by the handler running on this connection's read task;
    /// read concurrently by every broadcaster, hence the lock.
    room: RwLock<String>,
    /// Egress queue feeding this connection's write pump. Senders block
    /// while the queue is full.
    egress: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
}

impl Connection {
    /// Create a connection handle and the receiving end of its egress queue.
    ///
    /// The receiver goes to the write pump; everything else holds the
    /// handle.
    pub fn new(egress_capacity: usize) -> (Arc<Self>, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(egress_capacity);
        let conn = Arc::new(Self {
            id: ConnectionId::new(),
            room: RwLock::new(String::new()),
            egress: tx,
            cancel: CancellationToken::new(),
        });
        (conn, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Snapshot of the current room tag.
    pub async fn room(&self) -> String {
        self.room.read().await.clone()
    }

    /// Retag this connection into a different room.
    pub async fn set_room(&self, name: String) {
        *self.room.write().await = name;
    }

    /// Enqueue an outbound event, waiting while the queue is full.
    ///
    /// Errors only when the connection is being torn down.
    pub async fn enqueue(
        &self,
        event: Envelope,
    ) -> Result<(), mpsc::error::SendError<Envelope>> {
        self.egress.send(event).await
    }

    /// Signal both pumps to terminate. Called by the registry on removal.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Completes when the connection has been cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// Read pump: single loop over inbound frames, terminal on exit.
///
/// Transport errors and malformed envelopes terminate the session; a
/// dispatch error is logged and the loop continues. Expected closures
/// (close frame, stream end, idle deadline, cancellation) log at debug,
/// anything else at warn.
pub async fn run_read_pump(
    mut receiver: SplitStream<WebSocket>,
    conn: Arc<Connection>,
    registry: Arc<Registry>,
    pong_wait: Duration,
) {
    loop {
        let frame = tokio::select! {
            _ = conn.cancelled() => {
                tracing::debug!(connection_id = %conn.id(), "read pump cancelled");
                break;
            }
            frame = timeout(pong_wait, receiver.next()) => frame,
        };

        // timeout() elapsing means no frame (pong included) arrived within
        // pong_wait: the peer is gone.
        let result = match frame {
            Err(_) => {
                tracing::debug!(connection_id = %conn.id(), "inbound idle deadline expired");
                break;
            }
            Ok(None) => {
                tracing::debug!(connection_id = %conn.id(), "peer closed the stream");
                break;
            }
            Ok(Some(result)) => result,
        };

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(connection_id = %conn.id(), error = %e, "transport error on read");
                break;
            }
        };

        let bytes = match message {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(bytes) => bytes,
            Message::Pong(_) => {
                // Keepalive response; the next loop iteration re-arms the
                // idle deadline.
                tracing::trace!(connection_id = %conn.id(), "keepalive response received");
                continue;
            }
            Message::Ping(_) => {
                // Protocol-level pong is produced by axum automatically.
                continue;
            }
            Message::Close(_) => {
                tracing::debug!(connection_id = %conn.id(), "peer sent close frame");
                break;
            }
        };

        let envelope = match Envelope::decode(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(
                    connection_id = %conn.id(),
                    error = %e,
                    "malformed envelope, ending session"
                );
                break;
            }
        };

        if let Err(e) = registry.dispatch(&envelope, &conn).await {
            tracing::warn!(
                connection_id = %conn.id(),
                event_type = %envelope.kind,
                error = %e,
                "dispatch failed"
            );
        }
    }

    registry.deregister(conn.id()).await;
}

/// Write pump: drains the egress queue and emits keepalive probes.
///
/// Encode and send failures on data frames are logged and swallowed; the
/// read pump discovers a dead transport on its side. A failed keepalive
/// probe is the one fatal path here.
///
/// Shutdown is driven by the cancellation token: `deregister` cancels the
/// connection and the `cancelled` branch sends the Close frame. The
/// `Connection` held by this pump keeps its `mpsc::Sender` alive, so
/// `egress.recv()` cannot observe a closed queue while the pump runs; that
/// branch is a terminal fallback, not the working close path.
pub async fn run_write_pump(
    mut sender: SplitSink<WebSocket, Message>,
    mut egress: mpsc::Receiver<Envelope>,
    conn: Arc<Connection>,
    registry: Arc<Registry>,
    ping_interval: Duration,
) {
    let mut ping = interval(ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so probes start one
    // interval after connect.
    ping.tick().await;

    loop {
        tokio::select! {
            _ = conn.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                tracing::debug!(connection_id = %conn.id(), "write pump cancelled");
                break;
            }
            maybe = egress.recv() => match maybe {
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    tracing::debug!(connection_id = %conn.id(), "egress queue closed");
                    break;
                }
                Some(event) => {
                    let json = match event.encode() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(
                                connection_id = %conn.id(),
                                error = %e,
                                "dropping unencodable outbound event"
                            );
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(Message::Text(json)).await {
                        tracing::warn!(
                            connection_id = %conn.id(),
                            error = %e,
                            "failed to send data frame"
                        );
                    }
                }
            },
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    tracing::debug!(connection_id = %conn.id(), "keepalive probe failed");
                    break;
                }
            }
        }
    }

    registry.deregister(conn.id()).await;
}
