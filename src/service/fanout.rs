//! Best-effort fan-out of server events over room sessions.
//!
//! Events are serialized once and enqueued per connection. Enqueueing
//! never blocks; a full or closed queue drops the frame for that
//! connection only, so a slow or broken client cannot stall delivery to
//! the rest of the room. Safe to call while holding a room's lock.

use crate::domain::{ConnectionHandle, ConnectionId, Session};
use crate::ws::messages::ServerEvent;

/// Sends one event to a single connection.
///
/// Returns `true` if the frame was enqueued.
pub fn send_to(handle: &ConnectionHandle, event: &ServerEvent) -> bool {
    let Some(frame) = serialize(event) else {
        return false;
    };
    handle.send(frame)
}

/// Fans an event out to every session in the set.
///
/// Returns the number of sessions the frame was enqueued for.
pub fn broadcast(sessions: &[Session], event: &ServerEvent) -> usize {
    broadcast_filtered(sessions, event, |_| true)
}

/// Fans an event out to every session except those on `skip` connection.
///
/// Only the exact connection is excluded; sibling connections of the
/// same username still receive the event.
pub fn broadcast_except(sessions: &[Session], skip: ConnectionId, event: &ServerEvent) -> usize {
    broadcast_filtered(sessions, event, |s| s.connection.id() != skip)
}

fn broadcast_filtered(
    sessions: &[Session],
    event: &ServerEvent,
    keep: impl Fn(&Session) -> bool,
) -> usize {
    let Some(frame) = serialize(event) else {
        return 0;
    };
    let mut reached = 0;
    for session in sessions.iter().filter(|s| keep(s)) {
        if session.connection.send(frame.clone()) {
            reached += 1;
        }
    }
    reached
}

fn serialize(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(error) => {
            tracing::error!(%error, "failed to serialize server event");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RoomId;
    use tokio::sync::mpsc;

    fn session(username: &str, capacity: usize) -> (Session, mpsc::Receiver<String>) {
        let (handle, rx) = ConnectionHandle::channel(capacity);
        (
            Session {
                username: username.to_string(),
                connection: handle,
            },
            rx,
        )
    }

    fn chat_event() -> ServerEvent {
        ServerEvent::Chat {
            username: "alice".to_string(),
            text: "hi".to_string(),
            timestamp: "12:34".to_string(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_session() {
        let (alice, mut alice_rx) = session("alice", 4);
        let (bob, mut bob_rx) = session("bob", 4);

        let reached = broadcast(&[alice, bob], &chat_event());
        assert_eq!(reached, 2);
        assert!(alice_rx.recv().await.is_some());
        assert!(bob_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn broadcast_except_skips_only_that_connection() {
        let (alice, mut alice_rx) = session("alice", 4);
        let (bob_tab_one, mut tab_one_rx) = session("bob", 4);
        let (bob_tab_two, mut tab_two_rx) = session("bob", 4);
        let sender = bob_tab_one.connection.id();

        let reached = broadcast_except(
            &[alice, bob_tab_one, bob_tab_two],
            sender,
            &chat_event(),
        );
        assert_eq!(reached, 2);
        assert!(alice_rx.recv().await.is_some());
        assert!(tab_two_rx.recv().await.is_some());
        assert!(tab_one_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn slow_connection_does_not_block_the_rest() {
        let (stuck, _stuck_rx) = session("stuck", 1);
        // Fill the stuck session's queue.
        assert!(stuck.connection.send("backlog".to_string()));
        let (healthy, mut healthy_rx) = session("healthy", 4);

        let reached = broadcast(&[stuck, healthy], &chat_event());
        assert_eq!(reached, 1);
        assert!(healthy_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn send_to_single_connection() {
        let (target, mut rx) = session("alice", 4);
        let event = ServerEvent::RoomDataUpdated {
            room_id: RoomId::new("ABC123"),
            message: "You have successfully left the room.".to_string(),
        };
        assert!(send_to(&target.connection, &event));
        let Some(frame) = rx.recv().await else {
            panic!("frame not delivered");
        };
        assert!(frame.contains("room-data-updated"));
    }
}
