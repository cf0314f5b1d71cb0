//! Room entity and per-room membership bookkeeping.
//!
//! A [`Room`] owns an ordered, non-deduplicated list of [`Session`]s
//! (one per live connection) and derives its distinct membership from
//! them. All membership transitions go through [`Room::join`],
//! [`Room::leave`], and [`Room::remove_connection`] so that the derived
//! `userCount` can never drift from the live session list.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::connection::{ConnectionHandle, ConnectionId};
use super::room_id::RoomId;
use crate::error::GatewayError;

/// Room name used when the create payload omits one.
pub const DEFAULT_ROOM_NAME: &str = "Untitled-room";

/// One (username, connection) pair inside a room.
///
/// Not deduplicated: a user joining from a second tab holds a second
/// session under the same username.
#[derive(Debug, Clone)]
pub struct Session {
    /// Username asserted by the client for this connection.
    pub username: String,
    /// Outbound handle of the connection that joined.
    pub connection: ConnectionHandle,
}

/// Result of a successful [`Room::join`].
#[derive(Debug, Clone, Copy)]
pub struct JoinOutcome {
    /// `true` only if the username was not previously among the members.
    pub new_member: bool,
}

/// Result of a [`Room::leave`].
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// Whether a session matching both username and connection was removed.
    pub session_removed: bool,
    /// Whether the distinct membership count decreased.
    pub member_departed: bool,
    /// Whether the room has no sessions left (caller deletes it).
    pub now_empty: bool,
}

/// Result of [`Room::remove_connection`] (disconnect cleanup).
#[derive(Debug, Clone)]
pub struct ConnectionRemoval {
    /// Number of sessions removed.
    pub removed: usize,
    /// Usernames whose distinct membership ended with this removal.
    pub departed: Vec<String>,
    /// Whether the room has no sessions left (caller deletes it).
    pub now_empty: bool,
}

/// An ephemeral, capacity-bounded chat room.
///
/// `max_users` is a soft cap on *distinct* membership, checked only at
/// join time; the raw session count may exceed it when members hold
/// multiple connections.
#[derive(Debug)]
pub struct Room {
    /// Client-supplied identifier (immutable after creation).
    pub room_id: RoomId,
    /// Display name, defaulting to [`DEFAULT_ROOM_NAME`].
    pub room_name: String,
    /// Username of the creator.
    pub host: String,
    /// Cap on distinct membership.
    pub max_users: u32,
    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,
    sessions: Vec<Session>,
    deleted: bool,
}

impl Room {
    /// Creates a room seeded with the creator's session.
    #[must_use]
    pub fn new(
        room_id: RoomId,
        room_name: String,
        host: String,
        max_users: u32,
        creator: Session,
    ) -> Self {
        Self {
            room_id,
            room_name,
            host,
            max_users,
            created_at: Utc::now(),
            sessions: vec![creator],
            deleted: false,
        }
    }

    /// Marks the room as removed from the registry.
    ///
    /// Handlers that resolved this room before it was deleted observe
    /// the tombstone after locking and treat the room as missing instead
    /// of mutating an orphaned entry.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Returns `true` once the registry has deleted this room.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the live sessions in join order.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Returns distinct member usernames in first-appearance order.
    #[must_use]
    pub fn members(&self) -> Vec<String> {
        let mut members: Vec<String> = Vec::new();
        for session in &self.sessions {
            if !members.iter().any(|m| m == &session.username) {
                members.push(session.username.clone());
            }
        }
        members
    }

    /// Returns the number of distinct members (not raw sessions).
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.members().len()
    }

    /// Returns `true` if the username holds at least one session here.
    #[must_use]
    pub fn is_member(&self, username: &str) -> bool {
        self.sessions.iter().any(|s| s.username == username)
    }

    /// Adds a session for `username` over the given connection.
    ///
    /// An existing member may always attach another connection; a new
    /// username is only admitted below the cap.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RoomFull`] when distinct membership is at
    /// `max_users` and the username is not already a member, and
    /// [`GatewayError::RoomNotFound`] when the room has already been
    /// deleted from the registry (a join racing the last leave).
    pub fn join(
        &mut self,
        username: String,
        connection: ConnectionHandle,
    ) -> Result<JoinOutcome, GatewayError> {
        if self.deleted {
            return Err(GatewayError::RoomNotFound(self.room_id.clone()));
        }
        let already_member = self.is_member(&username);
        if !already_member && self.user_count() >= self.max_users as usize {
            return Err(GatewayError::RoomFull(self.room_id.clone()));
        }
        self.sessions.push(Session {
            username,
            connection,
        });
        Ok(JoinOutcome {
            new_member: !already_member,
        })
    }

    /// Removes exactly the session matching both username and connection.
    ///
    /// Absent sessions are a no-op, not an error; the outcome still
    /// reports the (unchanged) emptiness so callers can act uniformly.
    pub fn leave(&mut self, username: &str, connection_id: ConnectionId) -> LeaveOutcome {
        let count_before = self.user_count();
        let position = self
            .sessions
            .iter()
            .position(|s| s.username == username && s.connection.id() == connection_id);

        let Some(position) = position else {
            return LeaveOutcome {
                session_removed: false,
                member_departed: false,
                now_empty: self.sessions.is_empty(),
            };
        };

        self.sessions.remove(position);
        LeaveOutcome {
            session_removed: true,
            member_departed: self.user_count() < count_before,
            now_empty: self.sessions.is_empty(),
        }
    }

    /// Removes every session held by the given connection.
    ///
    /// Disconnect cleanup path: the username is recovered from the
    /// sessions themselves, since a closing socket may never have sent a
    /// `leave-room`.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> ConnectionRemoval {
        let members_before = self.members();
        let len_before = self.sessions.len();
        self.sessions.retain(|s| s.connection.id() != connection_id);

        let members_after = self.members();
        let departed = members_before
            .into_iter()
            .filter(|m| !members_after.iter().any(|kept| kept == m))
            .collect();

        ConnectionRemoval {
            removed: len_before - self.sessions.len(),
            departed,
            now_empty: self.sessions.is_empty(),
        }
    }

    /// Returns a serializable snapshot of the room.
    #[must_use]
    pub fn snapshot(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            host: self.host.clone(),
            user_count: self.user_count(),
            members: self.members(),
            max_users: self.max_users,
            created_at: self.created_at,
        }
    }
}

/// Serializable snapshot of a room for `room-info` and room listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// Room identifier.
    pub room_id: RoomId,
    /// Display name.
    pub room_name: String,
    /// Username of the creator.
    pub host: String,
    /// Distinct member count.
    pub user_count: usize,
    /// Distinct member usernames.
    pub members: Vec<String>,
    /// Cap on distinct membership.
    pub max_users: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn handle() -> ConnectionHandle {
        let (handle, _rx) = ConnectionHandle::channel(8);
        handle
    }

    fn make_room(max_users: u32) -> Room {
        Room::new(
            RoomId::new("ABC123"),
            DEFAULT_ROOM_NAME.to_string(),
            "alice".to_string(),
            max_users,
            Session {
                username: "alice".to_string(),
                connection: handle(),
            },
        )
    }

    #[tokio::test]
    async fn create_seeds_single_member() {
        let room = make_room(2);
        assert_eq!(room.user_count(), 1);
        assert_eq!(room.members(), vec!["alice".to_string()]);
        assert_eq!(room.sessions().len(), 1);
    }

    #[tokio::test]
    async fn join_new_member_is_flagged() {
        let mut room = make_room(2);
        let outcome = room.join("bob".to_string(), handle());
        let Ok(outcome) = outcome else {
            panic!("join should succeed");
        };
        assert!(outcome.new_member);
        assert_eq!(room.user_count(), 2);
        assert_eq!(room.members(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn join_at_capacity_rejects_new_username() {
        let mut room = make_room(2);
        let _ = room.join("bob".to_string(), handle());
        let result = room.join("carol".to_string(), handle());
        assert!(matches!(result, Err(GatewayError::RoomFull(_))));
        assert_eq!(room.user_count(), 2);
    }

    #[tokio::test]
    async fn existing_member_bypasses_capacity() {
        let mut room = make_room(2);
        let _ = room.join("bob".to_string(), handle());
        // Room is at cap, but bob may attach a second tab.
        let outcome = room.join("bob".to_string(), handle());
        let Ok(outcome) = outcome else {
            panic!("second connection should be admitted");
        };
        assert!(!outcome.new_member);
        assert_eq!(room.user_count(), 2);
        assert_eq!(room.sessions().len(), 3);
    }

    #[tokio::test]
    async fn join_on_deleted_room_is_rejected() {
        let mut room = make_room(4);
        room.mark_deleted();
        let result = room.join("bob".to_string(), handle());
        assert!(matches!(result, Err(GatewayError::RoomNotFound(_))));
        assert_eq!(room.sessions().len(), 1);
    }

    #[tokio::test]
    async fn user_count_tracks_distinct_usernames() {
        let mut room = make_room(5);
        let _ = room.join("bob".to_string(), handle());
        let _ = room.join("bob".to_string(), handle());
        let _ = room.join("carol".to_string(), handle());
        assert_eq!(room.sessions().len(), 4);
        assert_eq!(room.user_count(), 3);
    }

    #[tokio::test]
    async fn leave_removes_exactly_one_matching_session() {
        let mut room = make_room(5);
        let tab_one = handle();
        let tab_two = handle();
        let _ = room.join("bob".to_string(), tab_one.clone());
        let _ = room.join("bob".to_string(), tab_two);

        let outcome = room.leave("bob", tab_one.id());
        assert!(outcome.session_removed);
        // bob still has one tab open, so membership did not decrease.
        assert!(!outcome.member_departed);
        assert!(!outcome.now_empty);
        assert_eq!(room.user_count(), 2);
    }

    #[tokio::test]
    async fn leave_last_session_reports_departure() {
        let mut room = make_room(5);
        let bob = handle();
        let _ = room.join("bob".to_string(), bob.clone());

        let outcome = room.leave("bob", bob.id());
        assert!(outcome.session_removed);
        assert!(outcome.member_departed);
        assert!(!outcome.now_empty);
        assert_eq!(room.members(), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn leave_unknown_session_is_noop() {
        let mut room = make_room(5);
        let stranger = handle();
        let outcome = room.leave("bob", stranger.id());
        assert!(!outcome.session_removed);
        assert!(!outcome.member_departed);
        assert_eq!(room.user_count(), 1);
    }

    #[tokio::test]
    async fn leave_final_session_empties_room() {
        let mut room = make_room(5);
        let Some(alice_id) = room.sessions().first().map(|s| s.connection.id()) else {
            panic!("creator session missing");
        };
        let outcome = room.leave("alice", alice_id);
        assert!(outcome.session_removed);
        assert!(outcome.member_departed);
        assert!(outcome.now_empty);
    }

    #[tokio::test]
    async fn remove_connection_clears_all_its_sessions() {
        let mut room = make_room(5);
        let bob = handle();
        let _ = room.join("bob".to_string(), bob.clone());
        let _ = room.join("bob".to_string(), handle());

        let removal = room.remove_connection(bob.id());
        assert_eq!(removal.removed, 1);
        // bob's other tab keeps his membership alive.
        assert!(removal.departed.is_empty());
        assert!(!removal.now_empty);
    }

    #[tokio::test]
    async fn remove_connection_reports_departed_member() {
        let mut room = make_room(5);
        let bob = handle();
        let _ = room.join("bob".to_string(), bob.clone());

        let removal = room.remove_connection(bob.id());
        assert_eq!(removal.removed, 1);
        assert_eq!(removal.departed, vec!["bob".to_string()]);
        assert!(!removal.now_empty);
    }

    #[tokio::test]
    async fn snapshot_reflects_live_state() {
        let mut room = make_room(3);
        let _ = room.join("bob".to_string(), handle());
        let info = room.snapshot();
        assert_eq!(info.room_id, RoomId::new("ABC123"));
        assert_eq!(info.user_count, 2);
        assert_eq!(info.members, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(info.max_users, 3);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let room = make_room(2);
        let json = serde_json::to_value(room.snapshot()).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.get("roomId").is_some());
        assert!(json.get("userCount").is_some());
        assert!(json.get("maxUsers").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
