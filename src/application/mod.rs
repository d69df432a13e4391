//! Application layer: event handlers invoked by registry dispatch.

pub mod handlers;
