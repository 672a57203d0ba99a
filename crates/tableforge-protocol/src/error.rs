//! Error types for the protocol layer.

/// Errors that can occur while decoding boundary values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The patch body was not a JSON object.
    #[error("invalid config patch: {0}")]
    InvalidPatch(serde_json::Error),

    /// The patch parsed as JSON but was not a key/value object.
    #[error("config patch must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
