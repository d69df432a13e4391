//! WebSocket adapter: upgrade handling, the connection registry and the
//! per-connection pumps.

mod connection;
mod handler;
mod registry;

pub use connection::{run_read_pump, run_write_pump, Connection, ConnectionId};
pub use handler::{ws_handler, WsConnectParams};
pub use registry::Registry;
