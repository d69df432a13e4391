//! HTTP adapter: login endpoint, health check and router wiring.

mod dto;
mod login;
mod routes;

pub use dto::{ErrorResponse, LoginRequest, LoginResponse};
pub use login::login;
pub use routes::app_router;

use std::sync::Arc;

use crate::adapters::auth::OtpStore;
use crate::adapters::websocket::Registry;
use crate::config::AppConfig;

/// Shared state for every HTTP and WebSocket handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub otp_store: Arc<OtpStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, otp_store: Arc<OtpStore>, config: Arc<AppConfig>) -> Self {
        Self {
            registry,
            otp_store,
            config,
        }
    }
}
