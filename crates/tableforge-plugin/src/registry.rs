//! Dependency resolution and the load pass.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tableforge_mode::{ModeRegistry, ModeRepository, RegistrationWarning};
use tracing::{debug, info, warn};

use crate::{Plugin, PluginRegister, PluginSummary};

/// Collects plugin registrations, then loads them in dependency order.
#[derive(Default)]
pub struct PluginRegistry {
    registers: BTreeMap<String, PluginRegister>,
    duplicates: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin under `key`. Dependencies refer to plugins by
    /// key; the plugin must name itself the same.
    ///
    /// A key can be registered once. Later registrations under the same
    /// key are dropped and reported when the registry loads.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        register: impl FnOnce() -> Plugin + Send + 'static,
    ) -> &mut Self {
        match self.registers.entry(key.into()) {
            Entry::Vacant(slot) => {
                slot.insert(Box::new(register));
            }
            Entry::Occupied(slot) => self.duplicates.push(slot.key().clone()),
        }
        self
    }

    /// Registers an already built plugin under its own name.
    pub fn add(&mut self, plugin: Plugin) -> &mut Self {
        let key = plugin.name().to_string();
        self.register(key, move || plugin)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Builds every plugin, resolves the load order, and runs each
    /// surviving plugin's load callback exactly once.
    pub fn load(self) -> LoadReport {
        let mut warnings = Vec::new();
        for key in self.duplicates {
            record(&mut warnings, RegistrationWarning::DuplicatePlugin { key });
        }

        let mut plugins = BTreeMap::new();
        for (key, register) in self.registers {
            let plugin = register();
            if plugin.name().is_empty() {
                record(&mut warnings, RegistrationWarning::EmptyName { key });
                continue;
            }
            if plugin.name() != key {
                let name = plugin.name().to_string();
                record(&mut warnings, RegistrationWarning::NameMismatch { key, name });
                continue;
            }
            plugins.insert(key, plugin);
        }

        let layers = resolve(&plugins, &mut warnings);

        let mut repo = ModeRepository::new();
        let mut loaded = Vec::new();
        for (depth, layer) in layers.iter().enumerate() {
            for name in layer {
                let Some(plugin) = plugins.get_mut(name) else {
                    continue;
                };
                repo.set_plugin(name.as_str());
                plugin.load(&mut repo);
                info!(plugin = %name, version = plugin.version(), layer = depth, "plugin loaded");
                loaded.push(plugin.summary());
            }
        }

        let (modes, mode_warnings) = repo.into_parts();
        warnings.extend(mode_warnings);

        info!(
            plugins = loaded.len(),
            modes = modes.len(),
            warnings = warnings.len(),
            "plugin loading complete"
        );

        LoadReport {
            layers,
            plugins: loaded,
            modes,
            warnings,
        }
    }
}

/// The outcome of [`PluginRegistry::load`].
#[derive(Debug)]
pub struct LoadReport {
    /// Plugin names grouped by load layer, each layer in name order.
    pub layers: Vec<Vec<String>>,
    /// Loaded plugins in load order.
    pub plugins: Vec<PluginSummary>,
    /// Every mode registered by the loaded plugins.
    pub modes: ModeRegistry,
    pub warnings: Vec<RegistrationWarning>,
}

impl LoadReport {
    /// Plugin names in the order their load callbacks ran.
    pub fn load_order(&self) -> Vec<&str> {
        self.layers.iter().flatten().map(String::as_str).collect()
    }

    pub fn is_loaded(&self, plugin: &str) -> bool {
        self.layers.iter().flatten().any(|p| p == plugin)
    }

    /// `true` if nothing was excluded or rejected.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

fn record(warnings: &mut Vec<RegistrationWarning>, warning: RegistrationWarning) {
    warn!(%warning, "plugin excluded");
    warnings.push(warning);
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

enum Readiness {
    Ready,
    Waiting,
    Excluded(RegistrationWarning),
}

/// Checks one plugin against the plugins loaded in earlier passes.
fn readiness(
    plugins: &BTreeMap<String, Plugin>,
    plugin: &Plugin,
    loaded: &BTreeSet<&str>,
    excluded: &BTreeSet<&str>,
) -> Readiness {
    let mut waiting = false;
    for (dependency, &required) in plugin.dependencies() {
        let Some(found) = plugins.get(dependency) else {
            return Readiness::Excluded(RegistrationWarning::MissingDependency {
                plugin: plugin.name().to_string(),
                dependency: dependency.clone(),
            });
        };
        if found.version() < required {
            return Readiness::Excluded(RegistrationWarning::VersionMismatch {
                plugin: plugin.name().to_string(),
                dependency: dependency.clone(),
                required,
                found: found.version(),
            });
        }
        if excluded.contains(dependency.as_str()) {
            return Readiness::Excluded(RegistrationWarning::DependencyExcluded {
                plugin: plugin.name().to_string(),
                dependency: dependency.clone(),
            });
        }
        if !loaded.contains(dependency.as_str()) {
            waiting = true;
        }
    }
    if waiting {
        Readiness::Waiting
    } else {
        Readiness::Ready
    }
}

/// Computes the load layers, recording a warning for every excluded
/// plugin.
fn resolve(
    plugins: &BTreeMap<String, Plugin>,
    warnings: &mut Vec<RegistrationWarning>,
) -> Vec<Vec<String>> {
    let mut remaining: BTreeSet<&str> = plugins.keys().map(String::as_str).collect();
    let mut loaded: BTreeSet<&str> = BTreeSet::new();
    let mut excluded: BTreeSet<&str> = BTreeSet::new();
    let mut layers = Vec::new();

    while !remaining.is_empty() {
        let mut layer = Vec::new();
        let mut dropped = false;

        for &name in &remaining {
            let Some(plugin) = plugins.get(name) else {
                continue;
            };
            match readiness(plugins, plugin, &loaded, &excluded) {
                Readiness::Ready => layer.push(name),
                Readiness::Waiting => {}
                Readiness::Excluded(warning) => {
                    record(warnings, warning);
                    excluded.insert(name);
                    dropped = true;
                }
            }
        }

        remaining.retain(|name| !excluded.contains(name) && !layer.contains(name));

        if !layer.is_empty() {
            debug!(layer = layers.len(), plugins = ?layer, "load layer resolved");
            loaded.extend(layer.iter().copied());
            layers.push(layer.into_iter().map(String::from).collect());
            continue;
        }
        if dropped {
            // Dependents of what was just dropped get reported next pass.
            continue;
        }

        // No progress: every remaining plugin waits on another remaining one.
        for &name in &remaining {
            let path = cycle_path(plugins, name, &remaining);
            record(
                warnings,
                RegistrationWarning::DependencyCycle {
                    plugin: name.to_string(),
                    path,
                },
            );
        }
        excluded.extend(remaining.iter().copied());
        remaining.clear();
    }

    layers
}

/// Follows dependency edges from `start` until one revisits the current
/// path, and returns that path (e.g. `a -> b -> a`). Best effort: one
/// cycle is reported even if several exist.
fn cycle_path(
    plugins: &BTreeMap<String, Plugin>,
    start: &str,
    remaining: &BTreeSet<&str>,
) -> Vec<String> {
    let mut path = vec![start.to_string()];
    let mut visited = BTreeSet::new();
    if find_cycle(plugins, start, remaining, &mut path, &mut visited) {
        path
    } else {
        vec![start.to_string()]
    }
}

fn find_cycle(
    plugins: &BTreeMap<String, Plugin>,
    node: &str,
    remaining: &BTreeSet<&str>,
    path: &mut Vec<String>,
    visited: &mut BTreeSet<String>,
) -> bool {
    visited.insert(node.to_string());
    let Some(plugin) = plugins.get(node) else {
        return false;
    };
    for dependency in plugin.dependencies().keys() {
        if !remaining.contains(dependency.as_str()) {
            continue;
        }
        let closes = path.contains(dependency);
        path.push(dependency.clone());
        if closes {
            return true;
        }
        if !visited.contains(dependency) && find_cycle(plugins, dependency, remaining, path, visited) {
            return true;
        }
        path.pop();
    }
    false
}
