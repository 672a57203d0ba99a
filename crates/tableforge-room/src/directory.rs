//! Room directory: creates, tracks, and routes users to rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tableforge_mode::ModeRegistry;
use tableforge_protocol::{RoomId, UserId};
use tableforge_turn::LoopConfig;
use tracing::{debug, info};

use crate::{Room, RoomError, RoomInfo, Seat, User};

/// All live rooms and the users known to the kernel.
///
/// A user is in at most one room at a time; the user's own membership
/// record enforces this, the directory only routes. Users are kept from
/// first sight until [`forget_user`](Self::forget_user) drops them.
pub struct RoomDirectory {
    modes: Arc<ModeRegistry>,
    loop_config: LoopConfig,
    next_id: AtomicU64,
    rooms: RwLock<HashMap<RoomId, Arc<Room>>>,
    users: RwLock<HashMap<UserId, Arc<User>>>,
}

impl RoomDirectory {
    /// Creates an empty directory whose rooms pick modes from `modes` and
    /// run their games with `loop_config`.
    pub fn new(modes: Arc<ModeRegistry>, loop_config: LoopConfig) -> Arc<Self> {
        Arc::new(Self {
            modes,
            loop_config,
            next_id: AtomicU64::new(1),
            rooms: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        })
    }

    pub fn modes(&self) -> &Arc<ModeRegistry> {
        &self.modes
    }

    /// Returns the user with this id, creating it on first sight.
    pub fn user(&self, id: impl Into<UserId>) -> Arc<User> {
        let id = id.into();
        if let Some(user) = self.users.read().get(&id) {
            return Arc::clone(user);
        }
        let mut users = self.users.write();
        Arc::clone(users.entry(id.clone()).or_insert_with(|| User::new(id)))
    }

    /// Drops the user with this id from the registry.
    ///
    /// Only a user who is in no room and whose handle nobody else holds
    /// can be forgotten; returns whether it was.
    pub fn forget_user(&self, id: &UserId) -> bool {
        let mut users = self.users.write();
        let idle = users
            .get(id)
            .is_some_and(|user| Arc::strong_count(user) == 1 && user.room().is_none());
        if idle {
            users.remove(id);
            debug!(user = %id, "user forgotten");
        }
        idle
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Creates a room playing `mode_name`, owned by `user`.
    ///
    /// The creator must be eligible for the mode and not already in a
    /// room. They take slot 0.
    pub fn create_room(self: &Arc<Self>, user: &Arc<User>, mode_name: &str) -> Result<Arc<Room>, RoomError> {
        let mode = self
            .modes
            .get(mode_name)
            .ok_or_else(|| RoomError::ModeNotFound(mode_name.to_string()))?;
        mode.validate_user(user.id())
            .map_err(|reason| RoomError::NotEligible {
                user: user.id().clone(),
                mode: mode_name.to_string(),
                reason,
            })?;

        let mut membership = user.membership();
        if let Some(current) = *membership {
            return Err(RoomError::AlreadyInRoom(user.id().clone(), current));
        }
        let room_id = RoomId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let room = Arc::new(Room::new(
            room_id,
            mode,
            user,
            Arc::clone(&self.modes),
            self.loop_config.clone(),
            Arc::downgrade(self),
        ));
        user.set_spectator(false);
        *membership = Some(room_id);
        self.rooms.write().insert(room_id, Arc::clone(&room));
        info!(%room_id, mode = mode_name, owner = %user.id(), "room created");
        Ok(room)
    }

    /// Puts `user` into the room `room_id`.
    pub fn enter_room(&self, user: &Arc<User>, room_id: RoomId) -> Result<Seat, RoomError> {
        self.get(room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?
            .enter(user)
    }

    /// Takes `user` out of whatever room they are in.
    pub fn leave_room(&self, user: &Arc<User>) -> Result<(), RoomError> {
        let room_id = user
            .room()
            .ok_or_else(|| RoomError::NotInAnyRoom(user.id().clone()))?;
        self.get(room_id)
            .ok_or(RoomError::RoomNotFound(room_id))?
            .leave(user)
    }

    pub fn get(&self, room_id: RoomId) -> Option<Arc<Room>> {
        self.rooms.read().get(&room_id).cloned()
    }

    /// Info for every live room, by id.
    pub fn list(&self) -> Vec<RoomInfo> {
        let rooms: Vec<Arc<Room>> = self.rooms.read().values().cloned().collect();
        let mut infos: Vec<RoomInfo> = rooms.iter().map(|room| room.info()).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }

    pub(crate) fn remove(&self, room_id: RoomId) {
        if self.rooms.write().remove(&room_id).is_some() {
            info!(%room_id, "room removed");
        }
    }
}

impl std::fmt::Debug for RoomDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDirectory")
            .field("rooms", &self.len())
            .field("modes", &self.modes.len())
            .finish()
    }
}
