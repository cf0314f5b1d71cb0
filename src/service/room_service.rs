//! Room service: validates intent and dispatches envelope handlers.
//!
//! One handler per client envelope type. Each handler performs its
//! room's compound transition (session mutation, membership recompute,
//! broadcast decision, enqueue) under that room's lock as a single
//! atomic unit; fan-out never blocks, so holding the lock across it is
//! safe.

use std::sync::Arc;

use chrono::Local;

use crate::domain::{ConnectionHandle, ConnectionId, RoomId, RoomRegistry, Session};
use crate::error::GatewayError;
use crate::service::fanout;
use crate::ws::messages::{ClientRequest, ServerEvent};

/// Confirmation sent when a `leave-room` targets a room that no longer
/// exists; the client treats this as having left.
const LEAVE_ROOM_MISSING: &str = "Room not found, you are considered left.";

/// Confirmation sent after every processed `leave-room`.
const LEAVE_CONFIRMED: &str = "You have successfully left the room.";

/// Orchestration layer for all room operations.
///
/// Owns a reference to the [`RoomRegistry`]; replies and broadcasts go
/// out through the [`ConnectionHandle`]s stored in each room's sessions.
#[derive(Debug, Clone)]
pub struct RoomService {
    registry: Arc<RoomRegistry>,
}

impl RoomService {
    /// Creates a new `RoomService` over the given registry.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Returns a reference to the inner [`RoomRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Dispatches a validated request from the given connection.
    pub async fn handle(&self, request: ClientRequest, conn: &ConnectionHandle) {
        match request {
            ClientRequest::Create {
                room_id,
                username,
                room_name,
                max_users,
            } => {
                self.handle_create(room_id, username, room_name, max_users, conn)
                    .await;
            }
            ClientRequest::Join { room_id, username } => {
                self.handle_join(room_id, username, conn).await;
            }
            ClientRequest::Chat {
                room_id,
                username,
                text,
            } => {
                self.handle_chat(&room_id, username, text, conn).await;
            }
            ClientRequest::RequestRoomInfo { username } => {
                self.handle_room_list(&username, conn).await;
            }
            ClientRequest::LeaveRoom { room_id, username } => {
                self.handle_leave(room_id, &username, conn).await;
            }
        }
    }

    /// `create`: open (or replace) the room, seat the creator, and send
    /// the snapshot back. Never capacity-checked, no broadcast.
    async fn handle_create(
        &self,
        room_id: RoomId,
        username: String,
        room_name: String,
        max_users: u32,
        conn: &ConnectionHandle,
    ) {
        let creator = Session {
            username: username.clone(),
            connection: conn.clone(),
        };
        let info = self
            .registry
            .create_room(room_id.clone(), username, room_name, max_users, creator)
            .await;
        tracing::info!(room = %room_id, host = %info.host, max_users, "room created");
        fanout::send_to(conn, &ServerEvent::RoomInfo(info));
    }

    /// `join`: attach this connection to the room. A new distinct member
    /// is announced to every session (the joiner included) before the
    /// joiner receives its own snapshot.
    async fn handle_join(&self, room_id: RoomId, username: String, conn: &ConnectionHandle) {
        let Some(room_lock) = self.registry.get(&room_id).await else {
            let error = GatewayError::RoomNotFound(room_id);
            tracing::debug!(%error, "join rejected");
            reply_error(conn, &error);
            return;
        };

        let mut room = room_lock.lock().await;
        match room.join(username.clone(), conn.clone()) {
            Ok(outcome) => {
                if outcome.new_member {
                    fanout::broadcast(
                        room.sessions(),
                        &ServerEvent::NewUserJoined {
                            room_id: room_id.clone(),
                            new_member: username.clone(),
                            user_count: room.user_count(),
                            members: room.members(),
                        },
                    );
                    tracing::info!(room = %room_id, user = %username, "member joined");
                } else {
                    tracing::debug!(room = %room_id, user = %username, "extra connection joined");
                }
                fanout::send_to(conn, &ServerEvent::RoomInfo(room.snapshot()));
            }
            Err(error) => {
                drop(room);
                tracing::debug!(%error, "join rejected");
                reply_error(conn, &error);
            }
        }
    }

    /// `msg`: relay the chat line to every session except the exact
    /// sending connection. Sibling connections of the same username are
    /// not excluded. Unknown rooms drop the message with a log only.
    async fn handle_chat(
        &self,
        room_id: &RoomId,
        username: String,
        text: String,
        conn: &ConnectionHandle,
    ) {
        let Some(room_lock) = self.registry.get(room_id).await else {
            tracing::warn!(room = %room_id, "chat message for unknown room dropped");
            return;
        };

        let room = room_lock.lock().await;
        if room.is_deleted() {
            tracing::warn!(room = %room_id, "chat message for unknown room dropped");
            return;
        }
        let event = ServerEvent::Chat {
            username,
            text,
            timestamp: Local::now().format("%H:%M").to_string(),
        };
        let reached = fanout::broadcast_except(room.sessions(), conn.id(), &event);
        tracing::debug!(room = %room_id, reached, "chat relayed");
    }

    /// `request-room-info`: reply with snapshots of every room the user
    /// belongs to. No broadcast.
    async fn handle_room_list(&self, username: &str, conn: &ConnectionHandle) {
        let rooms = self.registry.rooms_containing_user(username).await;
        fanout::send_to(conn, &ServerEvent::RoomList(rooms));
    }

    /// `leave-room`: detach this connection's session. A missing room or
    /// session is idempotent success; the requester is always confirmed.
    async fn handle_leave(&self, room_id: RoomId, username: &str, conn: &ConnectionHandle) {
        let Some(room_lock) = self.registry.get(&room_id).await else {
            tracing::debug!(room = %room_id, "leave-room for unknown room");
            fanout::send_to(
                conn,
                &ServerEvent::RoomDataUpdated {
                    room_id,
                    message: LEAVE_ROOM_MISSING.to_string(),
                },
            );
            return;
        };

        let mut room = room_lock.lock().await;
        if room.is_deleted() {
            drop(room);
            tracing::debug!(room = %room_id, "leave-room raced a deleted room");
            fanout::send_to(
                conn,
                &ServerEvent::RoomDataUpdated {
                    room_id,
                    message: LEAVE_ROOM_MISSING.to_string(),
                },
            );
            return;
        }
        let outcome = room.leave(username, conn.id());
        if outcome.member_departed {
            fanout::broadcast(
                room.sessions(),
                &ServerEvent::UserLeft {
                    room_id: room_id.clone(),
                    username: username.to_string(),
                    user_count: room.user_count(),
                    members: room.members(),
                },
            );
            tracing::info!(room = %room_id, user = %username, "member left");
        }
        drop(room);

        if outcome.now_empty {
            self.registry.remove_if_empty(&room_id).await;
        }

        fanout::send_to(
            conn,
            &ServerEvent::RoomDataUpdated {
                room_id,
                message: LEAVE_CONFIRMED.to_string(),
            },
        );
    }

    /// Connection-close hook: detaches every session held by the closing
    /// connection, announcing departures and deleting drained rooms.
    ///
    /// Clients are not required to send `leave-room` before closing;
    /// without this hook an abrupt disconnect would leak sessions.
    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        let rooms = self
            .registry
            .rooms_containing_connection(connection_id)
            .await;

        for (room_id, room_lock) in rooms {
            let mut room = room_lock.lock().await;
            let removal = room.remove_connection(connection_id);
            if removal.removed == 0 {
                continue;
            }
            for username in &removal.departed {
                fanout::broadcast(
                    room.sessions(),
                    &ServerEvent::UserLeft {
                        room_id: room_id.clone(),
                        username: username.clone(),
                        user_count: room.user_count(),
                        members: room.members(),
                    },
                );
                tracing::info!(room = %room_id, user = %username, "member disconnected");
            }
            let now_empty = removal.now_empty;
            drop(room);

            if now_empty {
                self.registry.remove_if_empty(&room_id).await;
            }
        }
    }
}

/// Sends the client-facing `error` envelope for errors the protocol
/// surfaces; silent errors are only logged by the caller.
fn reply_error(conn: &ConnectionHandle, error: &GatewayError) {
    if let Some(message) = error.client_message() {
        fanout::send_to(
            conn,
            &ServerEvent::Error {
                error_message: message.to_string(),
            },
        );
    }
}
