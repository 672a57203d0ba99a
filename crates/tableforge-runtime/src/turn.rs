//! Turns, phases, and the builders a mode's turn-starter fills in.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Context, Data, Player, Snapshot};

/// Produces the phases of one turn, one per call.
///
/// Setting an empty name on the [`PhaseBuilder`] (or not setting one)
/// ends the turn.
pub type PhaseStarter =
    Box<dyn FnMut(&Context, &mut PhaseBuilder) -> Option<Data> + Send>;

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// One player's turn.
pub struct Turn {
    round: u32,
    player: Arc<Player>,
    data: Option<Data>,
    phase: Snapshot<Option<Arc<Phase>>>,
}

impl Turn {
    pub fn new(round: u32, player: Arc<Player>, data: Option<Data>) -> Self {
        Self {
            round,
            player,
            data,
            phase: Snapshot::new(None),
        }
    }

    /// Round number, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn player(&self) -> &Arc<Player> {
        &self.player
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone()?.downcast::<T>().ok()
    }

    /// The phase currently running, `None` before the first phase.
    pub fn phase(&self) -> Option<Arc<Phase>> {
        (*self.phase.load()).clone()
    }

    pub fn set_phase(&self, phase: Arc<Phase>) {
        self.phase.store(Some(phase));
    }
}

impl fmt::Debug for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Turn")
            .field("round", &self.round)
            .field("player", &self.player.user())
            .field("phase", &self.phase().map(|p| p.name().to_string()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// A named step within a turn.
pub struct Phase {
    name: String,
    data: Option<Data>,
}

impl Phase {
    pub fn new(name: impl Into<String>, data: Option<Data>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase").field("name", &self.name).finish()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Filled in by a mode's turn-starter to describe the next turn.
///
/// Leaving the player unset ends the game.
#[derive(Default)]
pub struct TurnBuilder {
    player: Option<Arc<Player>>,
    round: Option<u32>,
    phases: Option<PhaseStarter>,
}

/// What a turn-starter asked for, unpacked.
pub struct TurnPlan {
    pub player: Option<Arc<Player>>,
    /// Explicit round number; `None` means "previous round + 1".
    pub round: Option<u32>,
    pub phases: Option<PhaseStarter>,
}

impl TurnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whose turn it is. `None` ends the game.
    pub fn player(&mut self, player: Option<Arc<Player>>) -> &mut Self {
        self.player = player;
        self
    }

    /// Jumps to an explicit round number. Zero is ignored.
    pub fn round(&mut self, round: u32) -> &mut Self {
        self.round = (round > 0).then_some(round);
        self
    }

    /// Sets the phase-starter for this turn.
    pub fn on_next_phase(
        &mut self,
        f: impl FnMut(&Context, &mut PhaseBuilder) -> Option<Data> + Send + 'static,
    ) -> &mut Self {
        self.phases = Some(Box::new(f));
        self
    }

    pub fn into_plan(self) -> TurnPlan {
        TurnPlan {
            player: self.player,
            round: self.round,
            phases: self.phases,
        }
    }
}

/// Filled in by a phase-starter to name the next phase.
#[derive(Debug, Default)]
pub struct PhaseBuilder {
    name: String,
}

impl PhaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn into_name(self) -> String {
        self.name
    }
}
