//! Chat hub server binary.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chat_hub::adapters::auth::OtpStore;
use chat_hub::adapters::http::{app_router, AppState};
use chat_hub::adapters::websocket::Registry;
use chat_hub::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(AppConfig::load()?);
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let registry = Arc::new(Registry::new());
    let otp_store = Arc::new(OtpStore::new(config.websocket.otp_retention()));
    let sweeper = otp_store.start_sweeper(config.websocket.otp_sweep_interval());

    let state = AppState::new(registry.clone(), otp_store.clone(), config.clone());
    let app = app_router(state);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "chat hub listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    registry.close_all().await;
    otp_store.shutdown();
    sweeper.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
