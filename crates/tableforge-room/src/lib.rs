//! Rooms for Tableforge.
//!
//! A room binds a group of users to one mode: it tracks who holds a player
//! slot and who is watching, who owns the room, and the room's settings,
//! and it starts the game once enough players have joined.
//!
//! # Key types
//!
//! - [`RoomDirectory`]: allocates room ids, creates and looks up rooms
//! - [`Room`]: membership, ownership, mode, configuration, game start
//! - [`User`]: an identity plus the room it currently occupies
//! - [`RoomError`]: what a room operation can refuse, classified by
//!   [`ErrorKind`]
//!
//! # Locking
//!
//! Operations that touch both a user and a room take the user's lock
//! first, then the room's. Reads of the mode, the slots, the spectators and
//! the owner go through copy-on-write snapshots and take no lock at all.
//!
//! ```text
//! Forming ──start()──▶ Running ──game ends──▶ Forming
//!    │                                            │
//!    └──────── last player leaves ──▶ Disbanded ◀─┘
//! ```

mod directory;
mod error;
mod room;
mod user;

pub use directory::RoomDirectory;
pub use error::{ErrorKind, RoomError};
pub use room::{Room, RoomInfo, RoomState, Seat};
pub use user::User;
