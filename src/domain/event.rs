//! Wire event types for the hub protocol.
//!
//! Every frame on the wire is a two-stage envelope: an outer
//! `{type, payload}` wrapper whose payload stays undecoded until a handler
//! asks for the concrete shape. Keeping the payload opaque lets new event
//! types ride through the envelope without touching the codec.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::errors::DispatchError;

/// Wire tag for client-originated chat messages.
pub const EVENT_SEND_MESSAGE: &str = "send_message";
/// Wire tag for room changes.
pub const EVENT_CHANGE_ROOM: &str = "change_room";
/// Wire tag for server-originated broadcast messages.
pub const EVENT_NEW_MESSAGE: &str = "new_message";

/// The closed set of event types the hub understands.
///
/// The wire keeps string tags for extensibility; parsing them into this
/// union gives dispatch an exhaustive match instead of a runtime map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Client asks the hub to fan a chat message out to its room.
    SendMessage,
    /// Client moves itself to a different room.
    ChangeRoom,
    /// Server-stamped broadcast message. Outbound only.
    NewMessage,
}

impl EventKind {
    /// Parse a wire tag. Unknown tags are a dispatch error, not a decode
    /// error: the envelope itself was well-formed.
    pub fn parse(tag: &str) -> Result<Self, DispatchError> {
        match tag {
            EVENT_SEND_MESSAGE => Ok(EventKind::SendMessage),
            EVENT_CHANGE_ROOM => Ok(EventKind::ChangeRoom),
            EVENT_NEW_MESSAGE => Ok(EventKind::NewMessage),
            _ => Err(DispatchError::UnknownEventType {
                kind: tag.to_string(),
            }),
        }
    }

    /// The wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SendMessage => EVENT_SEND_MESSAGE,
            EventKind::ChangeRoom => EVENT_CHANGE_ROOM,
            EventKind::NewMessage => EVENT_NEW_MESSAGE,
        }
    }
}

/// Outer event wrapper: a type tag plus an opaque payload.
///
/// The payload is deferred-decoded per type via [`Envelope::payload_as`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Event type tag, e.g. `send_message`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-specific payload, left undecoded until a handler needs it.
    pub payload: Box<RawValue>,
}

impl Envelope {
    /// Build an envelope from a kind and a serializable payload.
    pub fn new<T: Serialize>(kind: EventKind, payload: &T) -> Result<Self, serde_json::Error> {
        let raw = serde_json::value::to_raw_value(payload)?;
        Ok(Self {
            kind: kind.as_str().to_string(),
            payload: raw,
        })
    }

    /// Decode one inbound frame into an envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode the envelope for the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the payload as a concrete event type.
    ///
    /// A failure here means the peer sent a recognized type tag with a
    /// malformed body, surfaced as [`DispatchError::BadPayload`].
    pub fn payload_as<'a, T: Deserialize<'a>>(&'a self) -> Result<T, DispatchError> {
        serde_json::from_str(self.payload.get()).map_err(|source| DispatchError::BadPayload {
            kind: self.kind.clone(),
            source,
        })
    }
}

/// Payload of a client `send_message` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessagePayload {
    pub message: String,
    pub from: String,
}

/// Payload of a client `change_room` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeRoomPayload {
    pub name: String,
}

/// Payload of a server-originated `new_message` broadcast.
///
/// `sent` is stamped by the hub when the message is fanned out, never
/// trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMessagePayload {
    pub message: String,
    pub from: String,
    pub sent: DateTime<Utc>,
}

impl NewMessagePayload {
    /// Stamp a client message with the current server time.
    pub fn stamp(inbound: SendMessagePayload) -> Self {
        Self {
            message: inbound.message,
            from: inbound.from,
            sent: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_type_tag_and_defers_payload() {
        let raw = br#"{"type":"send_message","payload":{"message":"hi","from":"alice"}}"#;
        let envelope = Envelope::decode(raw).unwrap();

        assert_eq!(envelope.kind, "send_message");

        let payload: SendMessagePayload = envelope.payload_as().unwrap();
        assert_eq!(payload.message, "hi");
        assert_eq!(payload.from, "alice");
    }

    #[test]
    fn envelope_roundtrips_through_encode() {
        let payload = SendMessagePayload {
            message: "hello".to_string(),
            from: "bob".to_string(),
        };
        let envelope = Envelope::new(EventKind::SendMessage, &payload).unwrap();
        let json = envelope.encode().unwrap();

        assert!(json.contains(r#""type":"send_message""#));

        let decoded = Envelope::decode(json.as_bytes()).unwrap();
        let decoded_payload: SendMessagePayload = decoded.payload_as().unwrap();
        assert_eq!(decoded_payload, payload);
    }

    #[test]
    fn unknown_tag_is_unknown_event_type() {
        let err = EventKind::parse("no_such_type").unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnknownEventType { ref kind } if kind == "no_such_type"
        ));
    }

    #[test]
    fn known_tags_parse_to_kinds() {
        assert_eq!(EventKind::parse("send_message").unwrap(), EventKind::SendMessage);
        assert_eq!(EventKind::parse("change_room").unwrap(), EventKind::ChangeRoom);
        assert_eq!(EventKind::parse("new_message").unwrap(), EventKind::NewMessage);
    }

    #[test]
    fn malformed_payload_is_bad_payload() {
        let raw = br#"{"type":"send_message","payload":{"message":42}}"#;
        let envelope = Envelope::decode(raw).unwrap();

        let err = envelope.payload_as::<SendMessagePayload>().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::BadPayload { ref kind, .. } if kind == "send_message"
        ));
    }

    #[test]
    fn new_message_stamp_preserves_content() {
        let before = Utc::now();
        let stamped = NewMessagePayload::stamp(SendMessagePayload {
            message: "hi".to_string(),
            from: "alice".to_string(),
        });

        assert_eq!(stamped.message, "hi");
        assert_eq!(stamped.from, "alice");
        assert!(stamped.sent >= before);
    }

    #[test]
    fn new_message_serializes_sent_timestamp() {
        let payload = NewMessagePayload {
            message: "hi".to_string(),
            from: "alice".to_string(),
            sent: Utc::now(),
        };
        let envelope = Envelope::new(EventKind::NewMessage, &payload).unwrap();
        let json = envelope.encode().unwrap();

        assert!(json.contains(r#""type":"new_message""#));
        assert!(json.contains(r#""sent":"#));
    }
}
