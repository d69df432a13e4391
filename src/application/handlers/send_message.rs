//! Handler for client `send_message` events.

use std::sync::Arc;

use crate::adapters::websocket::{Connection, Registry};
use crate::domain::{DispatchError, Envelope, EventKind, NewMessagePayload, SendMessagePayload};

/// Fan a chat message out to every connection in the sender's room.
///
/// The inbound payload is re-stamped with the server time and re-wrapped
/// as a `new_message` envelope; the sender receives its own message back
/// like every other room member.
pub async fn send_message(
    registry: &Registry,
    conn: &Arc<Connection>,
    envelope: &Envelope,
) -> Result<(), DispatchError> {
    let inbound: SendMessagePayload = envelope.payload_as()?;

    let stamped = NewMessagePayload::stamp(inbound);
    let outbound =
        Envelope::new(EventKind::NewMessage, &stamped).map_err(|source| {
            DispatchError::BadPayload {
                kind: EventKind::NewMessage.as_str().to_string(),
                source,
            }
        })?;

    let room = conn.room().await;
    tracing::debug!(
        connection_id = %conn.id(),
        room = %room,
        from = %stamped.from,
        "broadcasting message"
    );
    registry.broadcast_to_room(&room, outbound).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewMessagePayload;
    use serde_json::value::RawValue;

    fn envelope_for(message: &str, from: &str) -> Envelope {
        Envelope::new(
            EventKind::SendMessage,
            &SendMessagePayload {
                message: message.to_string(),
                from: from.to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fans_out_to_sender_and_room_mates() {
        let registry = Registry::new();
        let (sender, mut sender_rx) = Connection::new(8);
        let (mate, mut mate_rx) = Connection::new(8);
        registry.register(sender.clone()).await;
        registry.register(mate.clone()).await;

        send_message(&registry, &sender, &envelope_for("hi", "alice"))
            .await
            .unwrap();

        for rx in [&mut sender_rx, &mut mate_rx] {
            let out = rx.recv().await.unwrap();
            assert_eq!(out.kind, "new_message");
            let payload: NewMessagePayload = out.payload_as().unwrap();
            assert_eq!(payload.message, "hi");
            assert_eq!(payload.from, "alice");
        }
    }

    #[tokio::test]
    async fn skips_connections_in_other_rooms() {
        let registry = Registry::new();
        let (sender, mut sender_rx) = Connection::new(8);
        let (outsider, mut outsider_rx) = Connection::new(8);
        outsider.set_room("room1".to_string()).await;
        registry.register(sender.clone()).await;
        registry.register(outsider.clone()).await;

        send_message(&registry, &sender, &envelope_for("hi", "alice"))
            .await
            .unwrap();

        assert_eq!(sender_rx.recv().await.unwrap().kind, "new_message");
        assert!(outsider_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stamps_server_time() {
        let registry = Registry::new();
        let (sender, mut rx) = Connection::new(8);
        registry.register(sender.clone()).await;

        let before = chrono::Utc::now();
        send_message(&registry, &sender, &envelope_for("hi", "alice"))
            .await
            .unwrap();

        let payload: NewMessagePayload = rx.recv().await.unwrap().payload_as().unwrap();
        assert!(payload.sent >= before);
        assert!(payload.sent <= chrono::Utc::now());
    }

    #[tokio::test]
    async fn malformed_payload_is_bad_payload() {
        let registry = Registry::new();
        let (sender, _rx) = Connection::new(8);
        registry.register(sender.clone()).await;

        let envelope = Envelope {
            kind: "send_message".to_string(),
            payload: RawValue::from_string(r#"{"message":7}"#.to_string()).unwrap(),
        };
        let err = send_message(&registry, &sender, &envelope).await.unwrap_err();
        assert!(matches!(err, DispatchError::BadPayload { .. }));
    }
}
