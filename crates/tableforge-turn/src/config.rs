//! Game loop configuration.

use serde::{Deserialize, Serialize};
use tableforge_runtime::DEFAULT_MAX_DISPATCH_DEPTH;
use tracing::warn;

/// Limits and seeding for the game loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Hard cap on turns per game.
    pub max_turns: usize,
    /// Hard cap on phases within one turn.
    pub max_phases_per_turn: usize,
    /// How deeply triggers may nest event dispatch.
    pub max_dispatch_depth: usize,
    /// Fixed seed for seat shuffling. `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_turns: 2024,
            max_phases_per_turn: 100,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            seed: None,
        }
    }
}

impl LoopConfig {
    /// Default limits with a fixed shuffle seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Fixes any zero cap so the config is safe to use.
    ///
    /// Called automatically by [`GameLoop::new`](crate::GameLoop::new).
    pub fn validated(mut self) -> Self {
        if self.max_turns == 0 {
            warn!("max_turns is 0, using 1");
            self.max_turns = 1;
        }
        if self.max_phases_per_turn == 0 {
            warn!("max_phases_per_turn is 0, using 1");
            self.max_phases_per_turn = 1;
        }
        if self.max_dispatch_depth == 0 {
            warn!("max_dispatch_depth is 0, using 1");
            self.max_dispatch_depth = 1;
        }
        self
    }
}
