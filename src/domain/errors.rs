//! Error types for event dispatch.

use thiserror::Error;

/// Errors surfaced by dispatching an inbound event.
///
/// Both variants are recoverable from the registry's point of view: the
/// read pump that produced the event logs the error and decides whether
/// its session continues.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The envelope carried a type tag no handler is registered for.
    #[error("there is no such event type: {kind}")]
    UnknownEventType { kind: String },

    /// The type tag was recognized but its payload did not decode.
    #[error("bad payload for event type {kind}: {source}")]
    BadPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
