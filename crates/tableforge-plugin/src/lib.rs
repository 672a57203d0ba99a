//! Plugin loading for Tableforge.
//!
//! A plugin is a named, versioned unit of rule code. It may depend on
//! other plugins at a minimum version, and when it loads it registers
//! modes into a [`ModeRepository`].
//!
//! [`PluginRegistry::load`] resolves a load order in layers:
//!
//! ```text
//! layer 0: plugins without dependencies
//! layer 1: plugins whose dependencies are all in layer 0
//! layer n: plugins whose dependencies are all in layers < n
//! ```
//!
//! Plugins with a missing, too-old, or excluded dependency are dropped as
//! soon as that is known. When a pass makes no progress, whatever remains
//! is part of (or stuck behind) a dependency cycle and is dropped too.
//! Within a layer, plugins load in name order.

mod plugin;
mod registry;

pub use plugin::{Plugin, PluginRegister, PluginSummary};
pub use registry::{LoadReport, PluginRegistry};

pub use tableforge_mode::{ModeRepository, RegistrationWarning};
