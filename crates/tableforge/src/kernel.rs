//! The kernel: loaded plugins, their modes, and the room directory.

use std::sync::Arc;

use tableforge_mode::{ModeRegistry, ModeSummary};
use tableforge_plugin::{PluginRegistry, PluginSummary, RegistrationWarning};
use tableforge_protocol::{RoomId, UserId};
use tableforge_room::{Room, RoomDirectory, RoomError, RoomInfo, Seat, User};
use tracing::{error, info};

use crate::{KernelConfig, TableforgeError};

/// One running instance of the game kernel.
///
/// Owns everything that was process-wide state: the modes registered at
/// boot and the directory of live rooms. Cheap to share behind an `Arc`;
/// every method takes `&self`.
pub struct Kernel {
    config: KernelConfig,
    plugins: Vec<PluginSummary>,
    layers: Vec<Vec<String>>,
    warnings: Vec<RegistrationWarning>,
    rooms: Arc<RoomDirectory>,
}

impl Kernel {
    /// Loads every registered plugin and readies the room directory.
    ///
    /// Registration problems are kept as [`warnings`](Self::warnings) and
    /// the offending plugins or modes are left out. With
    /// `strict_registration` any warning aborts the boot instead.
    pub fn boot(config: KernelConfig, plugins: PluginRegistry) -> Result<Self, TableforgeError> {
        let report = plugins.load();
        if config.strict_registration && !report.is_clean() {
            error!(warnings = report.warnings.len(), "plugin registration failed in strict mode");
            return Err(TableforgeError::Fatal(report.warnings));
        }

        let modes = Arc::new(report.modes);
        info!(
            plugins = report.plugins.len(),
            modes = modes.len(),
            warnings = report.warnings.len(),
            "kernel booted"
        );
        Ok(Self {
            rooms: RoomDirectory::new(modes, config.game_loop.clone()),
            config,
            plugins: report.plugins,
            layers: report.layers,
            warnings: report.warnings,
        })
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Loaded plugins in load order.
    pub fn plugins(&self) -> &[PluginSummary] {
        &self.plugins
    }

    /// Plugin names grouped by load layer.
    pub fn load_layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// Diagnostics collected while loading plugins and registering modes.
    pub fn warnings(&self) -> &[RegistrationWarning] {
        &self.warnings
    }

    pub fn modes(&self) -> &Arc<ModeRegistry> {
        self.rooms.modes()
    }

    pub fn rooms(&self) -> &Arc<RoomDirectory> {
        &self.rooms
    }

    /// Returns the user with this id, creating it on first sight.
    pub fn user(&self, id: impl Into<UserId>) -> Arc<User> {
        self.rooms.user(id)
    }

    /// Drops an idle user from the registry. See
    /// [`RoomDirectory::forget_user`].
    pub fn forget_user(&self, id: &UserId) -> bool {
        self.rooms.forget_user(id)
    }

    /// The modes `user` may play, by name.
    pub fn list_modes(&self, user: &UserId) -> Vec<ModeSummary> {
        self.modes().list_for(user)
    }

    pub fn create_room(&self, user: &Arc<User>, mode: &str) -> Result<Arc<Room>, TableforgeError> {
        Ok(self.rooms.create_room(user, mode)?)
    }

    pub fn enter_room(&self, user: &Arc<User>, room_id: RoomId) -> Result<Seat, TableforgeError> {
        Ok(self.rooms.enter_room(user, room_id)?)
    }

    pub fn leave_room(&self, user: &Arc<User>) -> Result<(), TableforgeError> {
        Ok(self.rooms.leave_room(user)?)
    }

    pub fn room(&self, room_id: RoomId) -> Result<Arc<Room>, TableforgeError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id).into())
    }

    pub fn list_rooms(&self) -> Vec<RoomInfo> {
        self.rooms.list()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("plugins", &self.plugins.len())
            .field("warnings", &self.warnings.len())
            .field("rooms", &self.rooms)
            .finish()
    }
}
