//! Handler for client `change_room` events.

use std::sync::Arc;

use crate::adapters::websocket::Connection;
use crate::domain::{ChangeRoomPayload, DispatchError, Envelope};

/// Move the sending connection into a different room.
///
/// Only the connection's own read task reaches this handler, so there is
/// exactly one writer; broadcasters read the tag under its lock.
pub async fn change_room(
    conn: &Arc<Connection>,
    envelope: &Envelope,
) -> Result<(), DispatchError> {
    let payload: ChangeRoomPayload = envelope.payload_as()?;

    tracing::debug!(connection_id = %conn.id(), room = %payload.name, "changing room");
    conn.set_room(payload.name).await;

    Ok(())
}
