//! Error types for the game loop.

/// Why a game did not finish normally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoopError {
    /// A rule callback panicked.
    #[error("game loop panicked: {0}")]
    Panicked(String),

    #[error("game cancelled")]
    Cancelled,

    /// The blocking task was torn down before it could finish.
    #[error("game loop aborted: {0}")]
    Aborted(String),

    /// [`GameLoop::spawn`](crate::GameLoop::spawn) was called outside a
    /// Tokio runtime.
    #[error("no tokio runtime to run the game on")]
    NoRuntime,
}
