//! Users and their room membership.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};
use tableforge_protocol::{RoomId, UserId};

/// A logged-in identity and the one room it may currently occupy.
///
/// The membership lock serializes a user's room changes. Any operation
/// that needs both a user and a room takes this lock before the room's.
#[derive(Debug)]
pub struct User {
    id: UserId,
    room: Mutex<Option<RoomId>>,
    // Written by the room under its own lock, so that demoting a player
    // during a mode change does not need the user's lock.
    spectator: AtomicBool,
}

impl User {
    pub fn new(id: impl Into<UserId>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            room: Mutex::new(None),
            spectator: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// The room this user is in, if any.
    pub fn room(&self) -> Option<RoomId> {
        *self.room.lock()
    }

    /// `true` if the user watches their room rather than holding a slot.
    pub fn is_spectator(&self) -> bool {
        self.spectator.load(Ordering::Acquire)
    }

    pub(crate) fn membership(&self) -> MutexGuard<'_, Option<RoomId>> {
        self.room.lock()
    }

    pub(crate) fn set_spectator(&self, spectator: bool) {
        self.spectator.store(spectator, Ordering::Release);
    }
}
