//! Chat Hub - Real-time WebSocket Message Hub
//!
//! Multiplexes long-lived WebSocket connections through a central registry,
//! authenticates upgrades with single-use one-time passwords, and fans chat
//! messages out to the connections sharing a room tag.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
