//! Runtime context and trigger engine for Tableforge.
//!
//! While a game runs, everything rule code can observe or change lives in
//! one [`RuntimeContext`]: bound data, the room configuration, the seated
//! players, the current turn, and the trigger registry.
//!
//! # Key types
//!
//! - [`RuntimeContext`]: per-game state plus the trigger registry
//! - [`Context`]: an event-scoped view handed to rule callbacks; nested
//!   [`Context::invoke`] calls dispatch child events
//! - [`Trigger`]: a reaction to named [`Event`]s with a priority and an
//!   optional owning [`Player`]
//! - [`Turn`] / [`Phase`]: the two-level step structure of a game
//! - [`Snapshot`]: copy-on-write cell used for lock-free reads
//!
//! # Dispatch order
//!
//! Matching triggers run sorted by priority, then system triggers before
//! player triggers, then by seat distance from the anchoring player, then by
//! registration order. The sorted list is entered front to back and exited
//! back to front:
//!
//! ```text
//! enter T1 → enter T2 → enter T3 → exit T3 → exit T2 → exit T1
//! ```

mod context;
mod data;
mod event;
mod player;
mod snapshot;
mod trigger;
mod turn;

pub use context::{Context, Dispatch, RuntimeContext, DEFAULT_MAX_DISPATCH_DEPTH};
pub use data::{ConfigData, Data, DataCell, data};
pub use event::{Event, InvokeResult, Stage, names};
pub use player::{Participant, Player};
pub use snapshot::Snapshot;
pub use trigger::{Invoker, Trigger};
pub use turn::{Phase, PhaseBuilder, PhaseStarter, Turn, TurnBuilder, TurnPlan};

pub use tableforge_protocol::TriggerId;
