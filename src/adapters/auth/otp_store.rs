//! One-time-password store with bounded lifetime and background expiry.
//!
//! Issued keys are single-use: the first successful verification consumes
//! the entry, and a background sweeper removes entries that sit unconsumed
//! past the retention window. Issue, verify and sweep all serialize on one
//! mutex, so no pair of them can race on the map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A single-use, time-bounded credential.
#[derive(Debug, Clone)]
pub struct Otp {
    /// Opaque unique key handed to the client.
    pub key: String,
    /// Issue time, used for retention.
    pub created: Instant,
}

/// Store of outstanding one-time passwords.
pub struct OtpStore {
    entries: Mutex<HashMap<String, Instant>>,
    retention: Duration,
    shutdown: CancellationToken,
}

impl OtpStore {
    /// Create a store whose entries expire `retention` after issue.
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention,
            shutdown: CancellationToken::new(),
        }
    }

    /// Issue a fresh OTP and remember it until consumed or swept.
    pub async fn issue(&self) -> Otp {
        let otp = Otp {
            key: Uuid::new_v4().to_string(),
            created: Instant::now(),
        };
        let mut entries = self.entries.lock().await;
        entries.insert(otp.key.clone(), otp.created);
        otp
    }

    /// Verify a key and consume it.
    ///
    /// Returns true exactly once per issued key; false for keys that were
    /// never issued, already consumed, or already swept.
    pub async fn verify_and_consume(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        entries.remove(key).is_some()
    }

    /// Remove every entry older than the retention window.
    ///
    /// Public so tests can drive expiry deterministically instead of
    /// depending on sweeper cadence.
    pub async fn sweep_expired(&self) -> usize {
        let deadline = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, created| *created + self.retention >= deadline);
        before - entries.len()
    }

    /// Spawn the background sweeper, ticking every `sweep_interval` until
    /// [`OtpStore::shutdown`] is called.
    pub fn start_sweeper(self: &Arc<Self>, sweep_interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = store.shutdown.cancelled() => {
                        tracing::debug!("otp sweeper stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = store.sweep_expired().await;
                        if removed > 0 {
                            tracing::debug!(removed, "swept expired otps");
                        }
                    }
                }
            }
        })
    }

    /// Stop the background sweeper.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Number of outstanding (unconsumed, unswept) keys.
    pub async fn outstanding(&self) -> usize {
        self.entries.lock().await.len()
    }
}
