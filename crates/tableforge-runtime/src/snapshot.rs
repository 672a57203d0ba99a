//! Copy-on-write snapshot cell.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// An immutable value behind a swappable reference.
///
/// Readers call [`load`](Self::load) and keep the returned `Arc` for as
/// long as they like; the lock is only held for the pointer clone. Writers
/// build a whole new value and publish it with [`store`](Self::store) or
/// [`update`](Self::update). A reader never sees a half-written value.
///
/// Writers that must keep several snapshots consistent with each other
/// (owner + player slots, for example) still serialize through an outer
/// lock; the cell only makes single reads cheap.
pub struct Snapshot<T> {
    cell: RwLock<Arc<T>>,
}

impl<T> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: RwLock::new(Arc::new(value)),
        }
    }

    /// Wraps a value that is already shared.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            cell: RwLock::new(value),
        }
    }

    /// Returns the current value.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.cell.read())
    }

    /// Publishes a new value.
    pub fn store(&self, value: T) {
        self.store_arc(Arc::new(value));
    }

    pub fn store_arc(&self, value: Arc<T>) {
        *self.cell.write() = value;
    }

    /// Computes a new value from the current one and publishes it.
    ///
    /// The write lock is held while `f` runs, so concurrent `update` calls
    /// never lose each other's changes.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Arc<T> {
        let mut guard = self.cell.write();
        let next = Arc::new(f(&guard));
        *guard = Arc::clone(&next);
        next
    }
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Snapshot").field(&self.load()).finish()
    }
}
