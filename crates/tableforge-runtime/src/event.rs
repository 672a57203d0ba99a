//! Events and invocation results.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Data, Player};

/// Names of the events the game loop emits.
pub mod names {
    /// Once per player after seating, anchored to that player.
    pub const PLAYER_PREPARED: &str = "system:player_prepared";
    /// Once, after every player was prepared.
    pub const GAME_STARTED: &str = "system:game_started";
    /// At the start of every turn, after the turn was published.
    pub const TURN_STARTED: &str = "system:turn_started";
    /// At the start of every phase, anchored to the turn's player.
    pub const PHASE_STARTED: &str = "system:phase_started";
    /// Once, when the turn-starter reports no further player.
    pub const GAME_FINISHED: &str = "system:game_finished";
}

/// A named occurrence dispatched to matching triggers.
#[derive(Clone)]
pub struct Event {
    name: String,
    start_player: Option<Arc<Player>>,
    payload: Option<Data>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_player: None,
            payload: None,
        }
    }

    /// Anchors dispatch ordering at `player` instead of the turn's player.
    pub fn from_player(mut self, player: Arc<Player>) -> Self {
        self.start_player = Some(player);
        self
    }

    pub fn with_payload(mut self, payload: Data) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_player(&self) -> Option<&Arc<Player>> {
        self.start_player.as_ref()
    }

    pub fn payload<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.payload.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("start_player", &self.start_player.as_ref().map(|p| p.order()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// InvokeResult
// ---------------------------------------------------------------------------

/// Which half of a delivery a trigger is being called for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The forward pass, before any later trigger has seen the event.
    Entering,
    /// The reverse pass, after every later trigger has seen the event.
    Exiting,
}

/// Handed to each trigger invocation.
#[derive(Debug)]
pub struct InvokeResult {
    stage: Stage,
    fast_stop: bool,
}

impl InvokeResult {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            fast_stop: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stops the remaining invocations of the current pass.
    ///
    /// Stopping while entering skips the later triggers entirely; the
    /// exiting pass still unwinds the triggers that were entered.
    pub fn fast_stop(&mut self) {
        self.fast_stop = true;
    }

    pub fn is_fast_stopped(&self) -> bool {
        self.fast_stop
    }
}
