//! Domain layer: room identity, sessions, and the room registry.
//!
//! This module contains the server-side domain model: room and
//! connection identity, the room entity with its membership bookkeeping,
//! and the registry for concurrent room storage.

pub mod connection;
pub mod registry;
pub mod room;
pub mod room_id;

pub use connection::{ConnectionHandle, ConnectionId};
pub use registry::RoomRegistry;
pub use room::{Room, RoomInfo, Session};
pub use room_id::RoomId;
