//! Domain layer: the wire event model and its errors.

pub mod errors;
pub mod event;

pub use errors::DispatchError;
pub use event::{
    ChangeRoomPayload, Envelope, EventKind, NewMessagePayload, SendMessagePayload,
};
