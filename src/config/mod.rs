//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `CHAT_HUB`
//! prefix and nested keys use double underscores as separators, e.g.
//! `CHAT_HUB__SERVER__PORT=9000`.
//!
//! # Example
//!
//! ```no_run
//! use chat_hub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod error;
mod server;
mod websocket;

pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use websocket::WebSocketConfig;

use serde::Deserialize;

/// Root application configuration.
///
/// Load using [`AppConfig::load()`], which reads from environment variables
/// (and a `.env` file when present).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (bind address, environment, origins)
    #[serde(default)]
    pub server: ServerConfig,

    /// WebSocket configuration (keepalive, frame limits, OTP retention)
    #[serde(default)]
    pub websocket: WebSocketConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file when present (development), then reads
    /// environment variables with the `CHAT_HUB` prefix, `__` separating
    /// nested values: `CHAT_HUB__SERVER__PORT=9000` sets `server.port`.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_HUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.websocket.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_socket_addr_parses() {
        let config = AppConfig::default();
        assert_eq!(config.server.socket_addr().port(), 8082);
    }
}
