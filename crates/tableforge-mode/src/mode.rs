//! Mode definitions and their builder.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tableforge_protocol::UserId;
use tableforge_runtime::{Context, Data, Participant, TurnBuilder};

use crate::{ConfigForm, ModeError};

/// Player capacity of a mode that never sets one.
pub const DEFAULT_MAX_PLAYERS: usize = 32;

/// Smallest allowed minimum player count.
pub const DEFAULT_MIN_PLAYERS: usize = 1;

/// Decides whether a user may play a mode. `Err` carries the reason.
pub type Eligibility = Arc<dyn Fn(&UserId) -> Result<(), String> + Send + Sync>;

/// Produces a fresh [`ConfigForm`] for a room.
pub type ConfigFactory = Arc<dyn Fn() -> ConfigForm + Send + Sync>;

/// Runs once at game start with the shuffled participants.
///
/// May rewrite seat orders and attach per-participant data. The returned
/// value is bound into the runtime context.
pub type Initializer = Arc<dyn Fn(&Context, &mut [Participant]) -> Option<Data> + Send + Sync>;

/// Describes the next turn. Leaving the player unset ends the game. The
/// returned value becomes the turn's data.
pub type TurnStarter = Arc<dyn Fn(&Context, &mut TurnBuilder) -> Option<Data> + Send + Sync>;

// ---------------------------------------------------------------------------
// ModeDefinition
// ---------------------------------------------------------------------------

/// An immutable rule set, as registered by a plugin.
pub struct ModeDefinition {
    name: String,
    description: String,
    plugin: String,
    min_players: usize,
    max_players: usize,
    eligibility: Option<Eligibility>,
    random_order: bool,
    config_factory: Option<ConfigFactory>,
    initializer: Initializer,
    turn_starter: TurnStarter,
}

impl ModeDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Name of the plugin that registered this mode.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn min_players(&self) -> usize {
        self.min_players
    }

    /// Also the number of player slots a room running this mode has.
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Whether seats are shuffled before the initializer runs.
    pub fn random_order(&self) -> bool {
        self.random_order
    }

    /// Checks the mode's eligibility rule. Modes without one accept
    /// everybody.
    pub fn validate_user(&self, user: &UserId) -> Result<(), String> {
        match &self.eligibility {
            Some(check) => check(user),
            None => Ok(()),
        }
    }

    /// Builds a fresh configuration form. Every call returns new data.
    pub fn create_config(&self) -> ConfigForm {
        match &self.config_factory {
            Some(factory) => factory(),
            None => ConfigForm::empty(),
        }
    }

    pub fn initialize(&self, ctx: &Context, participants: &mut [Participant]) -> Option<Data> {
        (self.initializer)(ctx, participants)
    }

    pub fn start_turn(&self, ctx: &Context, builder: &mut TurnBuilder) -> Option<Data> {
        (self.turn_starter)(ctx, builder)
    }

    pub fn summary(&self) -> ModeSummary {
        ModeSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            min_players: self.min_players,
            max_players: self.max_players,
        }
    }
}

impl fmt::Debug for ModeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeDefinition")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("min_players", &self.min_players)
            .field("max_players", &self.max_players)
            .field("random_order", &self.random_order)
            .finish_non_exhaustive()
    }
}

/// What a mode listing shows about one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub name: String,
    pub description: String,
    pub min_players: usize,
    pub max_players: usize,
}

// ---------------------------------------------------------------------------
// ModeBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a [`ModeDefinition`].
///
/// ```ignore
/// repo.build_mode(|mode| {
///     mode.name("duel")
///         .players(2, 2)
///         .initializer(|_, _| None)
///         .turn_starter(next_turn)
/// })?;
/// ```
pub struct ModeBuilder {
    name: String,
    description: String,
    pub(crate) plugin: String,
    min_players: usize,
    max_players: usize,
    eligibility: Option<Eligibility>,
    random_order: bool,
    config_factory: Option<ConfigFactory>,
    initializer: Option<Initializer>,
    turn_starter: Option<TurnStarter>,
}

impl Default for ModeBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            plugin: String::new(),
            min_players: DEFAULT_MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            eligibility: None,
            random_order: true,
            config_factory: None,
            initializer: None,
            turn_starter: None,
        }
    }
}

impl ModeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the minimum player count (at least 1). Raises the maximum if
    /// it would fall below.
    pub fn min_players(mut self, min: usize) -> Self {
        self.min_players = min.max(DEFAULT_MIN_PLAYERS);
        self.max_players = self.max_players.max(self.min_players);
        self
    }

    /// Sets the maximum player count. A value below the current minimum
    /// is raised to the minimum.
    pub fn max_players(mut self, max: usize) -> Self {
        self.max_players = max.max(self.min_players);
        self
    }

    pub fn players(self, min: usize, max: usize) -> Self {
        self.min_players(min).max_players(max)
    }

    pub fn eligibility(
        mut self,
        check: impl Fn(&UserId) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.eligibility = Some(Arc::new(check));
        self
    }

    /// Keeps seats in joining order instead of shuffling them.
    pub fn disable_random_order(mut self) -> Self {
        self.random_order = false;
        self
    }

    pub fn config(mut self, factory: impl Fn() -> ConfigForm + Send + Sync + 'static) -> Self {
        self.config_factory = Some(Arc::new(factory));
        self
    }

    pub fn initializer(
        mut self,
        f: impl Fn(&Context, &mut [Participant]) -> Option<Data> + Send + Sync + 'static,
    ) -> Self {
        self.initializer = Some(Arc::new(f));
        self
    }

    pub fn turn_starter(
        mut self,
        f: impl Fn(&Context, &mut TurnBuilder) -> Option<Data> + Send + Sync + 'static,
    ) -> Self {
        self.turn_starter = Some(Arc::new(f));
        self
    }

    /// Validates and freezes the definition.
    pub fn build(self) -> Result<ModeDefinition, ModeError> {
        if self.name.trim().is_empty() {
            return Err(ModeError::MissingName);
        }
        let initializer = self
            .initializer
            .ok_or_else(|| ModeError::MissingInitializer(self.name.clone()))?;
        let turn_starter = self
            .turn_starter
            .ok_or_else(|| ModeError::MissingTurnStarter(self.name.clone()))?;
        Ok(ModeDefinition {
            name: self.name,
            description: self.description,
            plugin: self.plugin,
            min_players: self.min_players,
            max_players: self.max_players,
            eligibility: self.eligibility,
            random_order: self.random_order,
            config_factory: self.config_factory,
            initializer,
            turn_starter,
        })
    }
}
