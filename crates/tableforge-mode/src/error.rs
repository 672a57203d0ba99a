//! Error and diagnostic types for mode registration.

/// Why a [`ModeBuilder`](crate::ModeBuilder) could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("mode has no name")]
    MissingName,

    /// Without an initializer the game loop cannot seat anyone.
    #[error("mode {0} has no initializer")]
    MissingInitializer(String),

    /// Without a turn-starter the game loop cannot pick a turn.
    #[error("mode {0} has no turn starter")]
    MissingTurnStarter(String),
}

/// A non-fatal problem found while loading plugins and registering modes.
///
/// The offending plugin or mode is excluded; loading continues with the
/// rest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationWarning {
    /// A second mode tried to take a name that was already registered.
    /// The first registration is kept.
    #[error("mode {mode} from plugin {plugin} is already registered by {first}")]
    DuplicateMode {
        mode: String,
        plugin: String,
        first: String,
    },

    #[error("plugin {plugin} registered an invalid mode: {reason}")]
    InvalidMode { plugin: String, reason: ModeError },

    #[error("plugin {plugin} depends on {dependency}, which is not registered")]
    MissingDependency { plugin: String, dependency: String },

    /// The dependency exists but was itself excluded.
    #[error("plugin {plugin} depends on {dependency}, which was excluded")]
    DependencyExcluded { plugin: String, dependency: String },

    #[error("plugin {plugin} needs {dependency} >= {required}, found {found}")]
    VersionMismatch {
        plugin: String,
        dependency: String,
        required: u32,
        found: u32,
    },

    #[error("plugin {plugin} is in a dependency cycle: {}", .path.join(" -> "))]
    DependencyCycle { plugin: String, path: Vec<String> },

    /// A plugin registered under one key named itself something else.
    #[error("plugin registered as {key} calls itself {name}")]
    NameMismatch { key: String, name: String },

    #[error("plugin registered as {key} has no name")]
    EmptyName { key: String },

    /// A second plugin was registered under a taken key. The first
    /// registration is kept.
    #[error("plugin {key} is already registered")]
    DuplicatePlugin { key: String },
}

impl RegistrationWarning {
    /// The plugin the warning is about.
    pub fn plugin(&self) -> &str {
        match self {
            Self::DuplicateMode { plugin, .. }
            | Self::InvalidMode { plugin, .. }
            | Self::MissingDependency { plugin, .. }
            | Self::DependencyExcluded { plugin, .. }
            | Self::VersionMismatch { plugin, .. }
            | Self::DependencyCycle { plugin, .. } => plugin,
            Self::NameMismatch { key, .. }
            | Self::EmptyName { key }
            | Self::DuplicatePlugin { key } => key,
        }
    }
}
