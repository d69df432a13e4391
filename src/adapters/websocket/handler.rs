//! WebSocket upgrade handler.
//!
//! Gatekeeps the HTTP → WebSocket upgrade: the request must carry a valid
//! one-time password in its query string, and a browser-supplied `Origin`
//! header must match the allow-list. Only after both checks pass is the
//! transport upgraded, the connection registered and its pumps started.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;

use crate::adapters::http::AppState;
use crate::config::WebSocketConfig;

use super::connection::{run_read_pump, run_write_pump, Connection};
use super::registry::Registry;

/// Query parameters for the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsConnectParams {
    /// One-time password obtained from `POST /login`.
    pub otp: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws?otp=<key>`
///
/// Rejects with 403 when the request does not declare an allow-listed
/// `Origin`; with 401 before upgrading when the OTP is absent, unknown,
/// already consumed or expired.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsConnectParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let allowed = state.config.server.allowed_origins_list();
    if !origin_allowed(&headers, &allowed) {
        return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
    }

    let otp = match params.otp {
        Some(otp) => otp,
        None => return (StatusCode::UNAUTHORIZED, "Missing otp").into_response(),
    };
    if !state.otp_store.verify_and_consume(&otp).await {
        return (StatusCode::UNAUTHORIZED, "Invalid otp").into_response();
    }

    tracing::info!("new connection");

    let registry = state.registry.clone();
    let config = state.config.websocket.clone();
    ws.max_frame_size(config.max_frame_bytes)
        .max_message_size(config.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, registry, config))
}

/// Register the upgraded socket and start its two pumps.
async fn handle_socket(socket: WebSocket, registry: Arc<Registry>, config: WebSocketConfig) {
    let (sink, stream) = socket.split();
    let (conn, egress_rx) = Connection::new(config.egress_capacity);

    registry.register(conn.clone()).await;
    tracing::debug!(connection_id = %conn.id(), "connection registered");

    tokio::spawn(run_read_pump(
        stream,
        conn.clone(),
        registry.clone(),
        config.pong_wait(),
    ));
    tokio::spawn(run_write_pump(
        sink,
        egress_rx,
        conn,
        registry,
        config.ping_interval(),
    ));
}

/// The declared origin must match an allow-list entry exactly; a request
/// with no `Origin` header is refused like any other unlisted origin.
fn origin_allowed(headers: &HeaderMap, allowed: &[String]) -> bool {
    match headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        Some(origin) => allowed.iter().any(|entry| entry == origin),
        None => false,
    }
}
