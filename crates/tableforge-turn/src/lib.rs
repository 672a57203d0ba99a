//! Turn and phase game loop for Tableforge.
//!
//! Once a room starts a game, a [`GameLoop`] seats the players and then
//! repeatedly asks the mode for the next turn and, within each turn, the
//! next phase, emitting lifecycle events into the runtime context:
//!
//! ```text
//! player_prepared × N → game_started
//!   → turn_started → phase_started × k   (per turn)
//!   → ...
//! → game_finished
//! ```
//!
//! Rule callbacks are synchronous, so the loop runs on Tokio's blocking
//! pool. [`GameLoop::spawn`] supervises it and returns a [`GameHandle`]
//! that reports completion and can cancel the game.
//!
//! Both loops are capped ([`LoopConfig::max_turns`],
//! [`LoopConfig::max_phases_per_turn`]) so a faulty rule set still ends.

mod config;
mod driver;
mod error;
mod handle;

pub use config::LoopConfig;
pub use driver::GameLoop;
pub use error::LoopError;
pub use handle::{GameHandle, GameStatus, GameSummary};
