//! Authentication adapters: the one-time-password store.

mod otp_store;

pub use otp_store::{Otp, OtpStore};
