//! Unified error type for Tableforge.

use tableforge_mode::ModeError;
use tableforge_plugin::RegistrationWarning;
use tableforge_protocol::ProtocolError;
use tableforge_room::RoomError;
use tableforge_turn::LoopError;

/// Top-level error that wraps all crate-specific errors.
///
/// Each wrapped variant has a `From` impl, so `?` converts sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TableforgeError {
    /// A malformed request value (patch body, ids).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An incomplete mode definition.
    #[error(transparent)]
    Mode(#[from] ModeError),

    /// A refused room operation.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game that did not finish normally.
    #[error(transparent)]
    Loop(#[from] LoopError),

    /// The kernel configuration could not be parsed.
    #[error("invalid kernel config: {0}")]
    Config(#[from] serde_json::Error),

    /// Startup aborted because registration produced diagnostics and the
    /// kernel runs with `strict_registration`.
    #[error("plugin registration failed with {} warning(s)", .0.len())]
    Fatal(Vec<RegistrationWarning>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableforge_protocol::RoomId;

    #[test]
    fn test_from_room_error() {
        let err: TableforgeError = RoomError::RoomNotFound(RoomId(3)).into();
        assert!(matches!(err, TableforgeError::Room(_)));
        assert_eq!(err.to_string(), "room R-3 not found");
    }

    #[test]
    fn test_from_mode_error() {
        let err: TableforgeError = ModeError::MissingName.into();
        assert!(matches!(err, TableforgeError::Mode(_)));
    }

    #[test]
    fn test_from_loop_error() {
        let err: TableforgeError = LoopError::Cancelled.into();
        assert!(matches!(err, TableforgeError::Loop(_)));
    }

    #[test]
    fn test_fatal_counts_warnings() {
        let err = TableforgeError::Fatal(vec![RegistrationWarning::EmptyName { key: "x".into() }]);
        assert_eq!(err.to_string(), "plugin registration failed with 1 warning(s)");
    }
}
