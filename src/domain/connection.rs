//! Connection identity and outbound send handle.
//!
//! Each WebSocket connection is assigned a [`ConnectionId`] (UUID v4) and
//! a [`ConnectionHandle`] wrapping the bounded mpsc queue drained by that
//! connection's write loop. Handles are cheap to clone and are the only
//! way the rest of the gateway talks back to a client.

use std::fmt;

use tokio::sync::mpsc;

/// Unique identifier for a single WebSocket connection.
///
/// Generated once at upgrade time. Session matching (`leave-room`, the
/// sender exclusion in chat fan-out, disconnect cleanup) keys on this id
/// alone, so two tabs of the same user are distinct connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Send side of one connection's outbound frame queue.
///
/// The queue is bounded; [`ConnectionHandle::send`] never blocks. A full
/// queue means the client is not draining its socket fast enough, and the
/// frame is dropped for that connection only.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
}

impl ConnectionHandle {
    /// Creates a handle around an existing outbound queue sender.
    #[must_use]
    pub fn new(id: ConnectionId, outbound: mpsc::Sender<String>) -> Self {
        Self { id, outbound }
    }

    /// Creates a handle together with the receiver end of its queue.
    ///
    /// The connection's write loop owns the receiver and forwards each
    /// frame to the socket.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(ConnectionId::new(), tx), rx)
    }

    /// Returns this connection's identifier.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Enqueues a serialized frame without blocking.
    ///
    /// Returns `false` if the frame was dropped because the queue is full
    /// or the connection has gone away; the caller continues with the rest
    /// of the fan-out set either way.
    pub fn send(&self, frame: String) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection = %self.id, "outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection = %self.id, "outbound queue closed, dropping frame");
                false
            }
        }
    }
}
