//! # Tableforge
//!
//! Runtime kernel for turn-based multiplayer games.
//!
//! Plugins register modes (rule sets); users gather in rooms bound to a
//! mode; a started room runs a turn/phase game loop whose events are
//! delivered to triggers registered by rule code.
//!
//! ```text
//! PluginRegistry ─load─▶ ModeRegistry ─▶ RoomDirectory ─▶ Room ─start─▶ GameLoop
//!                                                                        │
//!                                              triggers ◀── RuntimeContext
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tableforge::prelude::*;
//!
//! # fn main() -> Result<(), TableforgeError> {
//! let mut plugins = PluginRegistry::new();
//! plugins.add(Plugin::new("classic", 1).on_load(|repo| {
//!     let _ = repo.build_mode(|b| {
//!         b.name("solo")
//!             .initializer(|_, _| None)
//!             .turn_starter(|_, _| None)
//!     });
//! }));
//!
//! let kernel = Kernel::boot(KernelConfig::default(), plugins)?;
//! let alice = kernel.user("alice");
//! let room = kernel.create_room(&alice, "solo")?;
//! // Inside a Tokio runtime: let game = room.start()?;
//! # let _ = room;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod kernel;

pub use config::KernelConfig;
pub use error::TableforgeError;
pub use kernel::Kernel;

pub use tableforge_mode as mode;
pub use tableforge_plugin as plugin;
pub use tableforge_protocol as protocol;
pub use tableforge_room as room;
pub use tableforge_runtime as runtime;
pub use tableforge_turn as turn;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it more than once is harmless; only the first call installs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

pub mod prelude {
    pub use crate::{Kernel, KernelConfig, TableforgeError, init_tracing};
    pub use tableforge_mode::{
        CheckOption, CheckboxGroup, ConfigForm, ModeBuilder, ModeDefinition, ModeRepository,
        ModeSummary, RadioGroup, RangeField,
    };
    pub use tableforge_plugin::{LoadReport, Plugin, PluginRegistry, RegistrationWarning};
    pub use tableforge_protocol::{ConfigPatch, Item, RoomId, UserId};
    pub use tableforge_room::{Room, RoomError, RoomInfo, Seat, User};
    pub use tableforge_runtime::{
        ConfigData, Context, Data, Event, InvokeResult, Participant, PhaseBuilder, Player, Stage,
        TurnBuilder, data, names,
    };
    pub use tableforge_turn::{GameHandle, GameStatus, GameSummary, LoopConfig};
}
