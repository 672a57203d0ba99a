//! Boundary types for Tableforge.
//!
//! This crate defines the values that cross the transport boundary between
//! the kernel and whatever serves it (HTTP handlers, a socket server, tests):
//!
//! - **Identity** ([`UserId`], [`RoomId`], [`TriggerId`]): newtype keys.
//! - **Configuration forms** ([`Item`], [`CheckItem`], [`Range`]): the
//!   rendered, serializable view of a room's settings.
//! - **Patches** ([`ConfigPatch`]): what a room owner sends back to change
//!   those settings.
//! - **Errors** ([`ProtocolError`]): what can go wrong while parsing them.
//!
//! ```text
//! Transport (requests) → Protocol (ids, items, patches) → Room / Mode layers
//! ```

mod error;
mod form;
mod types;

pub use error::ProtocolError;
pub use form::{CheckItem, ConfigPatch, Item, ItemKind, Range};
pub use types::{RoomId, TriggerId, UserId};
