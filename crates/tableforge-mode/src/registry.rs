//! Registration-time mode repository and the frozen registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tableforge_protocol::UserId;
use tracing::{info, warn};

use crate::{ModeBuilder, ModeDefinition, ModeSummary, RegistrationWarning};

/// Collects modes while plugins load.
///
/// Plugin load callbacks receive `&mut ModeRepository`. Once every plugin
/// has loaded, [`into_parts`](Self::into_parts) freezes the result.
#[derive(Debug, Default)]
pub struct ModeRepository {
    modes: BTreeMap<String, Arc<ModeDefinition>>,
    warnings: Vec<RegistrationWarning>,
    plugin: String,
}

impl ModeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes subsequent registrations to `plugin`.
    pub fn set_plugin(&mut self, plugin: impl Into<String>) {
        self.plugin = plugin.into();
    }

    /// The plugin currently loading.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Builds and registers one mode.
    ///
    /// An invalid builder or a name that is already taken is recorded as a
    /// warning and returned as the error; the first registration of a name
    /// wins.
    pub fn build_mode(
        &mut self,
        f: impl FnOnce(ModeBuilder) -> ModeBuilder,
    ) -> Result<Arc<ModeDefinition>, RegistrationWarning> {
        let mut builder = f(ModeBuilder::new());
        builder.plugin = self.plugin.clone();

        let mode = match builder.build() {
            Ok(mode) => mode,
            Err(reason) => {
                return Err(self.reject(RegistrationWarning::InvalidMode {
                    plugin: self.plugin.clone(),
                    reason,
                }));
            }
        };

        if let Some(first) = self.modes.get(mode.name()) {
            let warning = RegistrationWarning::DuplicateMode {
                mode: mode.name().to_string(),
                plugin: self.plugin.clone(),
                first: first.plugin().to_string(),
            };
            return Err(self.reject(warning));
        }

        info!(
            mode = mode.name(),
            plugin = %self.plugin,
            min = mode.min_players(),
            max = mode.max_players(),
            "mode registered"
        );
        let mode = Arc::new(mode);
        self.modes.insert(mode.name().to_string(), Arc::clone(&mode));
        Ok(mode)
    }

    /// Looks up a mode registered so far, e.g. one from a dependency.
    pub fn get(&self, name: &str) -> Option<Arc<ModeDefinition>> {
        self.modes.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn warnings(&self) -> &[RegistrationWarning] {
        &self.warnings
    }

    /// Freezes the registered modes and hands back the warnings.
    pub fn into_parts(self) -> (ModeRegistry, Vec<RegistrationWarning>) {
        (ModeRegistry { modes: self.modes }, self.warnings)
    }

    fn reject(&mut self, warning: RegistrationWarning) -> RegistrationWarning {
        warn!(%warning, "mode rejected");
        self.warnings.push(warning.clone());
        warning
    }
}

// ---------------------------------------------------------------------------
// ModeRegistry
// ---------------------------------------------------------------------------

/// The frozen set of modes, shared by every room.
#[derive(Debug, Default)]
pub struct ModeRegistry {
    modes: BTreeMap<String, Arc<ModeDefinition>>,
}

impl ModeRegistry {
    pub fn get(&self, name: &str) -> Option<Arc<ModeDefinition>> {
        self.modes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    /// Every mode, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModeDefinition>> {
        self.modes.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.modes.keys().cloned().collect()
    }

    /// Summaries of the modes `user` may play, sorted by name.
    pub fn list_for(&self, user: &UserId) -> Vec<ModeSummary> {
        self.modes
            .values()
            .filter(|m| m.validate_user(user).is_ok())
            .map(|m| m.summary())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
