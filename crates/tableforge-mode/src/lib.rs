//! Mode definitions for Tableforge.
//!
//! A *mode* is one rule set: how many players it takes, who may play it,
//! which settings a room owner can tweak, how players are initialized, and
//! how the next turn is chosen. Plugins register modes while they load;
//! afterwards the set is frozen and shared by every room.
//!
//! # Key types
//!
//! - [`ModeBuilder`]: fluent builder, validated once by [`ModeBuilder::build`]
//! - [`ModeDefinition`]: the immutable result
//! - [`ConfigForm`]: a mode's configurable settings and their renderer
//! - [`ModeRepository`]: registration-time handle given to plugins
//! - [`ModeRegistry`]: the frozen set rooms look modes up in
//! - [`RegistrationWarning`]: non-fatal diagnostics collected at startup

mod config;
mod error;
mod mode;
mod registry;

pub use config::{
    CheckOption, CheckboxCallback, CheckboxGroup, ConfigForm, RadioCallback, RadioGroup,
    RangeCallback, RangeField,
};
pub use error::{ModeError, RegistrationWarning};
pub use mode::{
    ConfigFactory, DEFAULT_MAX_PLAYERS, DEFAULT_MIN_PLAYERS, Eligibility, Initializer,
    ModeBuilder, ModeDefinition, ModeSummary, TurnStarter,
};
pub use registry::{ModeRegistry, ModeRepository};
