//! Event handlers.
//!
//! Pure functions from (event, sending connection) to side effects on the
//! registry and connections. Handlers run synchronously on the sending
//! connection's read task; their errors are reported back to that pump,
//! which logs them and keeps reading.

mod change_room;
mod send_message;

pub use change_room::change_room;
pub use send_message::send_message;
