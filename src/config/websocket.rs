//! WebSocket and one-time-password configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Ping interval as a fraction of `pong_wait`. Must stay strictly below 1.0
/// so probes go out before the peer's idle deadline expires.
const PING_FRACTION: f64 = 0.9;

/// WebSocket connection and OTP lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// How long to wait for any inbound frame (pong included) before the
    /// connection is considered dead, in milliseconds
    #[serde(default = "default_pong_wait_ms")]
    pub pong_wait_ms: u64,

    /// Maximum size of one inbound frame in bytes
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Capacity of each connection's egress queue. Broadcasters block when
    /// a queue is full, so this bounds how far a slow consumer can lag.
    #[serde(default = "default_egress_capacity")]
    pub egress_capacity: usize,

    /// How long an unconsumed OTP stays valid, in milliseconds
    #[serde(default = "default_otp_retention_ms")]
    pub otp_retention_ms: u64,

    /// How often the OTP store sweeps expired entries, in milliseconds
    #[serde(default = "default_otp_sweep_interval_ms")]
    pub otp_sweep_interval_ms: u64,
}

impl WebSocketConfig {
    /// Inbound idle deadline.
    pub fn pong_wait(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms)
    }

    /// Keepalive probe interval, `0.9 × pong_wait`.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis((self.pong_wait_ms as f64 * PING_FRACTION) as u64)
    }

    /// OTP retention window.
    pub fn otp_retention(&self) -> Duration {
        Duration::from_millis(self.otp_retention_ms)
    }

    /// OTP sweep cadence.
    pub fn otp_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.otp_sweep_interval_ms)
    }

    /// Validate websocket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pong_wait_ms == 0 {
            return Err(ValidationError::InvalidPongWait);
        }
        if self.max_frame_bytes == 0 {
            return Err(ValidationError::InvalidFrameSize);
        }
        if self.egress_capacity == 0 {
            return Err(ValidationError::InvalidEgressCapacity);
        }
        if self.otp_retention_ms == 0 || self.otp_sweep_interval_ms == 0 {
            return Err(ValidationError::InvalidOtpTiming);
        }
        Ok(())
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            pong_wait_ms: default_pong_wait_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            egress_capacity: default_egress_capacity(),
            otp_retention_ms: default_otp_retention_ms(),
            otp_sweep_interval_ms: default_otp_sweep_interval_ms(),
        }
    }
}

fn default_pong_wait_ms() -> u64 {
    10_000
}

fn default_max_frame_bytes() -> usize {
    1024
}

fn default_egress_capacity() -> usize {
    1
}

fn default_otp_retention_ms() -> u64 {
    5_000
}

fn default_otp_sweep_interval_ms() -> u64 {
    400
}
