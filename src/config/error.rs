//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Pong wait must be non-zero")]
    InvalidPongWait,

    #[error("Maximum frame size must be non-zero")]
    InvalidFrameSize,

    #[error("Egress queue capacity must be non-zero")]
    InvalidEgressCapacity,

    #[error("OTP retention and sweep interval must be non-zero")]
    InvalidOtpTiming,
}
