//! Error types for the room layer.

use tableforge_protocol::{RoomId, UserId};

/// Broad class of a [`RoomError`], for callers that map errors onto a
/// transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request names something that does not exist or does not fit.
    Validation,
    /// The caller is not allowed to do this.
    Authorization,
    /// The caller or the room is in the wrong state for this request.
    State,
}

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No registered mode has this name.
    #[error("no such mode: {0}")]
    ModeNotFound(String),

    /// The mode's eligibility check rejected the user.
    #[error("user {user} may not play {mode}: {reason}")]
    NotEligible {
        user: UserId,
        mode: String,
        reason: String,
    },

    /// Fewer players are seated than the mode requires.
    #[error("room {room} needs {required} players, has {present}")]
    NotEnoughPlayers {
        room: RoomId,
        required: usize,
        present: usize,
    },

    /// The user already occupies a room.
    #[error("user {0} is already in room {1}")]
    AlreadyInRoom(UserId, RoomId),

    /// The room does not exist, or was disbanded.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// An owner-only operation was attempted by someone else.
    #[error("user {0} is not the owner of room {1}")]
    NotOwner(UserId, RoomId),

    #[error("user {0} is not in any room")]
    NotInAnyRoom(UserId),

    /// The user is a member of a different room than the one targeted.
    #[error("user {user} is in room {current}, not {target}")]
    InOtherRoom {
        user: UserId,
        current: RoomId,
        target: RoomId,
    },

    /// The room's game has not finished yet.
    #[error("room {0} has a game in progress")]
    GameRunning(RoomId),

    /// The game could not be started because no Tokio runtime is running.
    #[error("no tokio runtime to start the game on")]
    NoRuntime,
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModeNotFound(_)
            | Self::NotEligible { .. }
            | Self::NotEnoughPlayers { .. }
            | Self::AlreadyInRoom(..)
            | Self::RoomNotFound(_) => ErrorKind::Validation,
            Self::NotOwner(..) => ErrorKind::Authorization,
            Self::NotInAnyRoom(_)
            | Self::InOtherRoom { .. }
            | Self::GameRunning(_)
            | Self::NoRuntime => ErrorKind::State,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classifies_variants() {
        let user = UserId::new("alice");
        assert_eq!(RoomError::ModeNotFound("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            RoomError::AlreadyInRoom(user.clone(), RoomId(1)).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RoomError::NotOwner(user.clone(), RoomId(1)).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(RoomError::NotInAnyRoom(user).kind(), ErrorKind::State);
        assert_eq!(RoomError::GameRunning(RoomId(1)).kind(), ErrorKind::State);
    }

    #[test]
    fn test_display_names_both_rooms() {
        let err = RoomError::InOtherRoom {
            user: UserId::new("bob"),
            current: RoomId(2),
            target: RoomId(5),
        };
        assert_eq!(err.to_string(), "user U-bob is in room R-2, not R-5");
    }
}
