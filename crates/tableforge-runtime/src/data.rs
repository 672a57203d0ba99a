//! Opaque payloads that rule code attaches to contexts, players, turns,
//! and phases.
//!
//! The kernel never looks inside these values. Rule code stores whatever
//! type it likes and reads it back with a typed accessor that returns
//! `None` when nothing is bound or the type does not match.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// A shared, type-erased payload.
pub type Data = Arc<dyn Any + Send + Sync>;

/// Wraps a value as [`Data`].
pub fn data<T: Any + Send + Sync>(value: T) -> Data {
    Arc::new(value)
}

// ---------------------------------------------------------------------------
// DataCell
// ---------------------------------------------------------------------------

/// A rebindable slot holding at most one [`Data`] value.
#[derive(Default)]
pub struct DataCell {
    slot: RwLock<Option<Data>>,
}

impl DataCell {
    pub fn new(initial: Option<Data>) -> Self {
        Self {
            slot: RwLock::new(initial),
        }
    }

    /// Replaces the bound value.
    pub fn bind(&self, value: Data) {
        *self.slot.write() = Some(value);
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Returns the raw bound value.
    pub fn get(&self) -> Option<Data> {
        self.slot.read().clone()
    }

    /// Returns the bound value if it is a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for DataCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = self.slot.read().is_some();
        f.debug_struct("DataCell").field("bound", &bound).finish()
    }
}

// ---------------------------------------------------------------------------
// ConfigData
// ---------------------------------------------------------------------------

/// Mutable configuration data produced by a mode's configuration factory.
///
/// The room's form callbacks write into it when the owner changes a
/// setting; the running game reads it through the runtime context. Cloning
/// shares the same underlying value.
#[derive(Clone)]
pub struct ConfigData {
    inner: Arc<RwLock<Box<dyn Any + Send + Sync>>>,
}

impl ConfigData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Box::new(value))),
        }
    }

    /// Configuration data for modes without settings.
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Runs `f` against the value if it is a `T`.
    pub fn read<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.inner.read();
        guard.downcast_ref::<T>().map(f)
    }

    /// Runs `f` against a mutable borrow of the value if it is a `T`.
    pub fn write<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.inner.write();
        guard.downcast_mut::<T>().map(f)
    }

    /// Returns `true` if both handles share the same value.
    pub fn same_as(&self, other: &ConfigData) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ConfigData {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigData").finish_non_exhaustive()
    }
}
