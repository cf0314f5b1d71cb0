//! Concurrent room storage with per-room fine-grained locking.
//!
//! [`RoomRegistry`] stores all live rooms in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::Mutex`]. Compound
//! membership transitions on one room serialize on that room's lock;
//! independent rooms proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::connection::ConnectionId;
use super::room::{Room, RoomInfo, Session};
use super::room_id::RoomId;

/// Central store for all live rooms.
///
/// Uses a `RwLock<HashMap<...>>` for the outer index and per-entry
/// `Arc<Mutex<Room>>` for fine-grained per-room locking.
///
/// # Concurrency
///
/// - Lock order is always index-then-room.
/// - Mutations of the same room are serialized.
/// - Mutations of different rooms are concurrent.
/// - Index scans hold the read lock, taking each room's lock only long
///   enough to copy membership.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room seeded with the creator's session, returning its
    /// snapshot.
    ///
    /// Creation is never capacity-checked and unconditionally replaces
    /// any existing room under the same id (logged, since the old room's
    /// sessions are silently orphaned).
    pub async fn create_room(
        &self,
        room_id: RoomId,
        host: String,
        room_name: String,
        max_users: u32,
        creator: Session,
    ) -> RoomInfo {
        let room = Room::new(room_id.clone(), room_name, host, max_users, creator);
        let info = room.snapshot();

        let mut map = self.rooms.write().await;
        if map
            .insert(room_id.clone(), Arc::new(Mutex::new(room)))
            .is_some()
        {
            tracing::warn!(room = %room_id, "create replaced an existing room");
        }
        info
    }

    /// Returns the room behind its per-room lock, if it exists.
    pub async fn get(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Removes the room if its session list is empty.
    ///
    /// Emptiness is re-checked under the index write lock so a concurrent
    /// join that races the last leave keeps the room alive. The removed
    /// room is tombstoned under its own lock, so a handler that resolved
    /// its `Arc` before the removal finds [`Room::is_deleted`] set and
    /// treats the room as missing.
    pub async fn remove_if_empty(&self, room_id: &RoomId) -> bool {
        let mut map = self.rooms.write().await;
        let Some(room_lock) = map.get(room_id).cloned() else {
            return false;
        };
        let mut room = room_lock.lock().await;
        let empty = room.sessions().is_empty();
        if empty {
            room.mark_deleted();
            drop(room);
            map.remove(room_id);
            tracing::info!(room = %room_id, "room deleted, all users left");
        }
        empty
    }

    /// Returns snapshots of every room holding a session for `username`,
    /// in registry iteration order.
    pub async fn rooms_containing_user(&self, username: &str) -> Vec<RoomInfo> {
        let map = self.rooms.read().await;
        let mut snapshots = Vec::new();
        for room_lock in map.values() {
            let room = room_lock.lock().await;
            if room.is_member(username) {
                snapshots.push(room.snapshot());
            }
        }
        snapshots
    }

    /// Returns every room holding a session over the given connection.
    ///
    /// Used by disconnect cleanup, which is keyed by connection alone.
    pub async fn rooms_containing_connection(
        &self,
        connection_id: ConnectionId,
    ) -> Vec<(RoomId, Arc<Mutex<Room>>)> {
        let map = self.rooms.read().await;
        let mut found = Vec::new();
        for (room_id, room_lock) in map.iter() {
            let room = room_lock.lock().await;
            if room
                .sessions()
                .iter()
                .any(|s| s.connection.id() == connection_id)
            {
                found.push((room_id.clone(), Arc::clone(room_lock)));
            }
        }
        found
    }

    /// Returns the number of live rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Returns `true` if no rooms are live.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
