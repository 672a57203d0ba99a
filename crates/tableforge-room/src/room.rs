//! A room: membership, ownership, mode, configuration, and game start.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tableforge_mode::{ConfigForm, ModeDefinition, ModeRegistry};
use tableforge_protocol::{ConfigPatch, Item, RoomId, UserId};
use tableforge_runtime::Snapshot;
use tableforge_turn::{GameHandle, GameLoop, LoopConfig};
use tracing::{debug, info};

use crate::{RoomDirectory, RoomError, User};

/// Where [`Room::enter`] placed a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seat {
    /// Holds the player slot at this index.
    Player(usize),
    Spectator,
}

/// Lifecycle of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    /// Accepting members; no game in progress.
    Forming,
    /// A game is in progress.
    Running,
    /// The last player left and the room was removed from its directory.
    Disbanded,
}

/// A snapshot of room metadata, suitable for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    pub mode: String,
    pub state: RoomState,
    pub owner: Option<UserId>,
    /// One entry per slot; `None` is an empty slot.
    pub players: Vec<Option<UserId>>,
    pub spectators: Vec<UserId>,
}

/// A lobby bound to one mode.
///
/// Structural changes (enter, leave, mode change, start) serialize on the
/// room lock. Reads of the mode, slots, spectators and owner take a
/// snapshot and hold no lock.
pub struct Room {
    id: RoomId,
    name: Snapshot<String>,
    modes: Arc<ModeRegistry>,
    loop_config: LoopConfig,
    directory: Weak<RoomDirectory>,

    structure: RwLock<()>,
    disbanded: AtomicBool,
    mode: Snapshot<ModeDefinition>,
    owner: Snapshot<Option<Arc<User>>>,
    slots: Snapshot<Vec<Option<Arc<User>>>>,
    spectators: Snapshot<Vec<Arc<User>>>,
    config: Mutex<ConfigForm>,
    game: Mutex<Option<GameHandle>>,
}

impl Room {
    /// Creates a room owned by `owner`, who takes slot 0.
    ///
    /// The caller is responsible for the owner's membership record.
    pub(crate) fn new(
        id: RoomId,
        mode: Arc<ModeDefinition>,
        owner: &Arc<User>,
        modes: Arc<ModeRegistry>,
        loop_config: LoopConfig,
        directory: Weak<RoomDirectory>,
    ) -> Self {
        let mut slots = vec![None; mode.max_players()];
        slots[0] = Some(Arc::clone(owner));
        Self {
            id,
            name: Snapshot::new(format!("room-{}", id.0)),
            modes,
            loop_config,
            directory,
            structure: RwLock::new(()),
            disbanded: AtomicBool::new(false),
            config: Mutex::new(mode.create_config()),
            mode: Snapshot::from_arc(mode),
            owner: Snapshot::new(Some(Arc::clone(owner))),
            slots: Snapshot::new(slots),
            spectators: Snapshot::default(),
            game: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Display name; `room-{id}` until renamed.
    pub fn name(&self) -> String {
        String::clone(&self.name.load())
    }

    pub fn rename(&self, name: impl Into<String>) {
        let name = name.into();
        debug!(room_id = %self.id, %name, "room renamed");
        self.name.store(name);
    }

    pub fn mode(&self) -> Arc<ModeDefinition> {
        self.mode.load()
    }

    /// Number of player slots, which is the mode's maximum player count.
    pub fn capacity(&self) -> usize {
        self.slots.load().len()
    }

    pub fn owner(&self) -> Option<Arc<User>> {
        Option::clone(&self.owner.load())
    }

    pub fn is_owner(&self, user: &User) -> bool {
        self.is_owner_id(user.id())
    }

    /// The player slots, empty ones included.
    pub fn slots(&self) -> Arc<Vec<Option<Arc<User>>>> {
        self.slots.load()
    }

    /// Seated players in slot order.
    pub fn players(&self) -> Vec<Arc<User>> {
        self.slots.load().iter().flatten().cloned().collect()
    }

    pub fn spectators(&self) -> Arc<Vec<Arc<User>>> {
        self.spectators.load()
    }

    pub fn seat_of(&self, user: &UserId) -> Option<Seat> {
        let slots = self.slots.load();
        if let Some(index) = slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|u| u.id() == user))
        {
            return Some(Seat::Player(index));
        }
        self.spectators
            .load()
            .iter()
            .any(|u| u.id() == user)
            .then_some(Seat::Spectator)
    }

    pub fn is_disbanded(&self) -> bool {
        self.disbanded.load(Ordering::Acquire)
    }

    /// The handle of the most recently started game.
    pub fn game(&self) -> Option<GameHandle> {
        self.game.lock().clone()
    }

    pub fn state(&self) -> RoomState {
        if self.is_disbanded() {
            RoomState::Disbanded
        } else if self.game.lock().as_ref().is_some_and(GameHandle::is_running) {
            RoomState::Running
        } else {
            RoomState::Forming
        }
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name(),
            mode: self.mode().name().to_string(),
            state: self.state(),
            owner: self.owner().map(|u| u.id().clone()),
            players: self
                .slots
                .load()
                .iter()
                .map(|slot| slot.as_ref().map(|u| u.id().clone()))
                .collect(),
            spectators: self.spectators.load().iter().map(|u| u.id().clone()).collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Adds `user` to the room.
    ///
    /// Takes the first empty slot, or a spectator seat if the room is full
    /// or the mode rejects the user. Entering a room one is already in
    /// succeeds and reports the current seat.
    pub fn enter(&self, user: &Arc<User>) -> Result<Seat, RoomError> {
        let mut membership = user.membership();
        match *membership {
            Some(current) if current == self.id => {
                return self
                    .seat_of(user.id())
                    .ok_or(RoomError::RoomNotFound(self.id));
            }
            Some(current) => return Err(RoomError::AlreadyInRoom(user.id().clone(), current)),
            None => {}
        }

        let _structure = self.structure.write();
        if self.is_disbanded() {
            return Err(RoomError::RoomNotFound(self.id));
        }
        let slot = match self.mode.load().validate_user(user.id()) {
            Ok(()) => self.take_slot(user),
            Err(reason) => {
                debug!(room_id = %self.id, user = %user.id(), %reason, "user not eligible, seating as spectator");
                None
            }
        };
        let seat = match slot {
            Some(index) => Seat::Player(index),
            None => {
                self.spectators.update(|spectators| {
                    let mut next = spectators.clone();
                    next.push(Arc::clone(user));
                    next
                });
                Seat::Spectator
            }
        };
        user.set_spectator(seat == Seat::Spectator);
        *membership = Some(self.id);
        info!(room_id = %self.id, user = %user.id(), ?seat, "user entered");
        Ok(seat)
    }

    fn take_slot(&self, user: &Arc<User>) -> Option<usize> {
        let mut taken = None;
        self.slots.update(|slots| {
            let mut next = slots.clone();
            if let Some(index) = next.iter().position(Option::is_none) {
                next[index] = Some(Arc::clone(user));
                taken = Some(index);
            }
            next
        });
        taken
    }

    /// Removes `user` from the room.
    ///
    /// If the owner leaves, the player in the lowest occupied slot becomes
    /// owner. If no player is left, the room is disbanded: it leaves its
    /// directory, its spectators are released, and a running game is
    /// cancelled.
    pub fn leave(&self, user: &Arc<User>) -> Result<(), RoomError> {
        let mut membership = user.membership();
        match *membership {
            None => return Err(RoomError::NotInAnyRoom(user.id().clone())),
            Some(current) if current != self.id => {
                return Err(RoomError::InOtherRoom {
                    user: user.id().clone(),
                    current,
                    target: self.id,
                });
            }
            Some(_) => {}
        }

        let released = {
            let _structure = self.structure.write();
            *membership = None;
            user.set_spectator(false);
            self.remove_member(user.id())
        };
        drop(membership);

        for spectator in released {
            let mut membership = spectator.membership();
            if *membership == Some(self.id) {
                *membership = None;
                spectator.set_spectator(false);
            }
        }
        Ok(())
    }

    /// Returns the spectators to release if the room was disbanded.
    fn remove_member(&self, id: &UserId) -> Vec<Arc<User>> {
        if self.spectators.load().iter().any(|u| u.id() == id) {
            self.spectators
                .update(|spectators| spectators.iter().filter(|u| u.id() != id).cloned().collect());
            info!(room_id = %self.id, user = %id, "spectator left");
            return Vec::new();
        }

        // A spectator released by a concurrent disband can still point here.
        if !self.slots.load().iter().flatten().any(|u| u.id() == id) {
            debug!(room_id = %self.id, user = %id, "stale member left");
            return Vec::new();
        }

        let slots = self.slots.update(|slots| {
            slots
                .iter()
                .map(|slot| match slot {
                    Some(u) if u.id() == id => None,
                    other => other.clone(),
                })
                .collect()
        });
        info!(room_id = %self.id, user = %id, "player left");

        let Some(next_owner) = slots.iter().flatten().next().cloned() else {
            return self.disband();
        };
        if self.is_owner_id(id) {
            info!(room_id = %self.id, from = %id, to = %next_owner.id(), "owner transferred");
            self.owner.store(Some(next_owner));
        }
        Vec::new()
    }

    fn disband(&self) -> Vec<Arc<User>> {
        self.disbanded.store(true, Ordering::Release);
        self.owner.store(None);
        let spectators = self.spectators.load();
        self.spectators.store(Vec::new());
        if let Some(game) = self.game.lock().take() {
            game.cancel();
        }
        if let Some(directory) = self.directory.upgrade() {
            directory.remove(self.id);
        }
        info!(room_id = %self.id, "room disbanded");
        Vec::clone(&spectators)
    }

    // -----------------------------------------------------------------------
    // Mode and configuration
    // -----------------------------------------------------------------------

    /// Switches the room to another mode. Owner only.
    ///
    /// Resets the configuration and resizes the slots to the new mode's
    /// capacity. Players that no longer fit become spectators, except the
    /// owner, who keeps a slot.
    pub fn set_mode(&self, user: &User, mode_name: &str) -> Result<(), RoomError> {
        let mode = self
            .modes
            .get(mode_name)
            .ok_or_else(|| RoomError::ModeNotFound(mode_name.to_string()))?;
        self.ensure_owner(user)?;

        let _structure = self.structure.write();
        // Ownership may have moved while we waited for the lock.
        self.ensure_owner(user)?;
        if self.mode.load().name() == mode.name() {
            return Ok(());
        }
        self.ensure_idle()?;

        *self.config.lock() = mode.create_config();
        let demoted = self.resize(mode.max_players());
        self.mode.store_arc(Arc::clone(&mode));
        info!(room_id = %self.id, mode = mode.name(), demoted, "mode changed");
        Ok(())
    }

    /// Rebuilds the slots at `capacity`. Returns how many players were
    /// demoted to spectators.
    fn resize(&self, capacity: usize) -> usize {
        let slots = self.slots.load();
        let mut next: Vec<Option<Arc<User>>> = vec![None; capacity];
        if slots.len() <= capacity {
            next[..slots.len()].clone_from_slice(&slots);
            self.slots.store(next);
            return 0;
        }

        let mut occupants: Vec<Arc<User>> = slots.iter().flatten().cloned().collect();
        if occupants.len() > capacity {
            let owner = occupants.iter().position(|u| self.is_owner_id(u.id()));
            if let Some(index) = owner.filter(|&index| index >= capacity) {
                occupants.swap(0, index);
            }
        }
        let overflow = occupants.split_off(capacity.min(occupants.len()));
        for (slot, user) in next.iter_mut().zip(occupants) {
            *slot = Some(user);
        }
        for user in &overflow {
            user.set_spectator(true);
        }
        self.spectators.update(|spectators| {
            let mut next = spectators.clone();
            next.extend(overflow.iter().cloned());
            next
        });
        self.slots.store(next);
        overflow.len()
    }

    /// Renders the room's settings for `user`.
    ///
    /// The owner gets addressable items; everyone else a readonly view.
    pub fn config_for(&self, user: &User) -> Vec<Item> {
        let readonly = !self.is_owner(user);
        self.config.lock().render(readonly)
    }

    /// Applies a settings patch. Owner only.
    ///
    /// The patch targets the items of the owner's last render; without one
    /// it changes nothing. Returns the number of values that changed.
    pub fn update_config(&self, user: &User, patch: &ConfigPatch) -> Result<usize, RoomError> {
        self.ensure_owner(user)?;
        let _structure = self.structure.read();
        self.ensure_idle()?;
        let changed = self.config.lock().apply(patch);
        debug!(room_id = %self.id, changed, "config updated");
        Ok(changed)
    }

    /// Restores the mode's default settings. Owner only.
    pub fn reset_config(&self, user: &User) -> Result<(), RoomError> {
        self.ensure_owner(user)?;
        let _structure = self.structure.write();
        self.ensure_idle()?;
        *self.config.lock() = self.mode.load().create_config();
        debug!(room_id = %self.id, "config reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Game
    // -----------------------------------------------------------------------

    /// Starts a game with the seated players.
    ///
    /// Needs at least the mode's minimum number of players and no game in
    /// progress; a room can be started again once its last game ended.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<GameHandle, RoomError> {
        let _structure = self.structure.write();
        if self.is_disbanded() {
            return Err(RoomError::RoomNotFound(self.id));
        }
        let mut game = self.game.lock();
        if game.as_ref().is_some_and(GameHandle::is_running) {
            return Err(RoomError::GameRunning(self.id));
        }

        let mode = self.mode.load();
        let users: Vec<UserId> = self.players().iter().map(|u| u.id().clone()).collect();
        if users.len() < mode.min_players() {
            return Err(RoomError::NotEnoughPlayers {
                room: self.id,
                required: mode.min_players(),
                present: users.len(),
            });
        }

        let (data, view) = {
            let mut form = self.config.lock();
            (form.data().clone(), form.render(true))
        };
        let players = users.len();
        // Spawning only fails outside a runtime.
        let handle = GameLoop::new(Arc::clone(&mode), users, data, view, self.loop_config.clone())
            .spawn(self.id)
            .map_err(|_| RoomError::NoRuntime)?;
        *game = Some(handle.clone());
        info!(room_id = %self.id, mode = mode.name(), players, "game started");
        Ok(handle)
    }

    // -----------------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------------

    fn is_owner_id(&self, id: &UserId) -> bool {
        self.owner().is_some_and(|owner| owner.id() == id)
    }

    fn ensure_owner(&self, user: &User) -> Result<(), RoomError> {
        if self.is_owner(user) {
            Ok(())
        } else {
            Err(RoomError::NotOwner(user.id().clone(), self.id))
        }
    }

    fn ensure_idle(&self) -> Result<(), RoomError> {
        if self.game.lock().as_ref().is_some_and(GameHandle::is_running) {
            Err(RoomError::GameRunning(self.id))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("mode", &self.mode().name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
