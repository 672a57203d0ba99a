//! Seated players of a running game.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tableforge_protocol::UserId;

use crate::{Data, DataCell};

/// A user seated in one running game.
///
/// Created by the game loop after the mode's initializer has run. The seat
/// order is fixed from then on; liveness and bound data can change.
#[derive(Debug)]
pub struct Player {
    user: UserId,
    order: usize,
    alive: AtomicBool,
    data: DataCell,
}

impl Player {
    pub fn new(user: UserId, order: usize, data: Option<Data>) -> Self {
        Self {
            user,
            order,
            alive: AtomicBool::new(true),
            data: DataCell::new(data),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Zero-based seat order, unique within the game.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Marks the player dead. Dead players are skipped by player iteration
    /// and their triggers stop firing.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn revive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    pub fn bind_data(&self, data: Data) {
        self.data.bind(data);
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.get_as::<T>()
    }

    pub fn raw_data(&self) -> Option<Data> {
        self.data.get()
    }
}

/// A player-to-be, handed to the mode's initializer.
///
/// The initializer may rewrite `order` and attach `data`. Orders are
/// normalized afterwards: participants are sorted by the order they were
/// given (stable) and renumbered `0..N`.
#[derive(Debug, Clone)]
pub struct Participant {
    pub user: UserId,
    pub order: usize,
    pub data: Option<Data>,
}

impl Participant {
    pub fn new(user: UserId, order: usize) -> Self {
        Self {
            user,
            order,
            data: None,
        }
    }

    pub fn bind_data(&mut self, data: Data) {
        self.data = Some(data);
    }
}
