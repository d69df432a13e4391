//! Router wiring for the hub's HTTP surface.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use http::header::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adapters::websocket::ws_handler;

use super::login::login;
use super::AppState;

/// Assemble the application router: login, WebSocket upgrade and health.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route("/login", post(login))
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /healthz - liveness plus the current connection count.
async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let connections = state.registry.connection_count().await;
    Json(serde_json::json!({ "status": "ok", "connections": connections }))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .allowed_origins_list()
        .into_iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(origins)
}
