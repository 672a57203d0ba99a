//! The plugin record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tableforge_mode::ModeRepository;

/// Produces a [`Plugin`] when the registry loads.
pub type PluginRegister = Box<dyn FnOnce() -> Plugin + Send>;

type LoadFn = Box<dyn FnOnce(&mut ModeRepository) + Send>;

/// A named, versioned unit of rule code.
pub struct Plugin {
    name: String,
    description: String,
    version: u32,
    dependencies: BTreeMap<String, u32>,
    on_load: Option<LoadFn>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version,
            dependencies: BTreeMap::new(),
            on_load: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Requires plugin `name` at `min_version` or newer.
    pub fn depends_on(mut self, name: impl Into<String>, min_version: u32) -> Self {
        self.dependencies.insert(name.into(), min_version);
        self
    }

    /// Sets the callback that registers this plugin's modes.
    pub fn on_load(mut self, f: impl FnOnce(&mut ModeRepository) + Send + 'static) -> Self {
        self.on_load = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn dependencies(&self) -> &BTreeMap<String, u32> {
        &self.dependencies
    }

    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version,
        }
    }

    /// Runs the load callback, at most once.
    pub(crate) fn load(&mut self, repo: &mut ModeRepository) {
        if let Some(f) = self.on_load.take() {
            f(repo);
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// What a plugin listing shows about a loaded plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSummary {
    pub name: String,
    pub description: String,
    pub version: u32,
}
