//! Adapters: HTTP surface, WebSocket machinery and the OTP store.

pub mod auth;
pub mod http;
pub mod websocket;
