//! Completion status and control of a running game.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tableforge_protocol::RoomId;
use tableforge_runtime::RuntimeContext;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Counters of a finished game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub turns: usize,
    pub phases: usize,
    /// Round number of the last turn; 0 if no turn was played.
    pub last_round: u32,
    /// `true` if a turn or phase cap cut the game short.
    pub capped: bool,
}

/// Where a game is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    Finished(GameSummary),
    /// A rule callback panicked or the task was aborted.
    Failed(String),
    Cancelled,
}

impl GameStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Observes and controls one spawned game.
///
/// Cheap to clone; every clone sees the same status.
#[derive(Clone)]
pub struct GameHandle {
    room: RoomId,
    status: watch::Receiver<GameStatus>,
    cancel: CancellationToken,
    runtime: Arc<RuntimeContext>,
}

impl GameHandle {
    pub(crate) fn new(
        room: RoomId,
        status: watch::Receiver<GameStatus>,
        cancel: CancellationToken,
        runtime: Arc<RuntimeContext>,
    ) -> Self {
        Self {
            room,
            status,
            cancel,
            runtime,
        }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    /// The current status, without waiting.
    pub fn status(&self) -> GameStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    /// Waits until the game is no longer running and returns how it ended.
    pub async fn finished(&self) -> GameStatus {
        let mut rx = self.status.clone();
        if let Ok(status) = rx.wait_for(|s| !s.is_running()).await {
            return status.clone();
        }
        // The supervisor is gone; report the last status it published.
        rx.borrow().clone()
    }

    /// Asks the game to stop. The loop checks between turns and phases.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The game's runtime context, for inspection.
    pub fn runtime(&self) -> &Arc<RuntimeContext> {
        &self.runtime
    }
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle")
            .field("room", &self.room)
            .field("status", &*self.status.borrow())
            .finish()
    }
}
