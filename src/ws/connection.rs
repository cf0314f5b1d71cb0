//! WebSocket connection state machine.
//!
//! Runs the read/write loop for a single WebSocket connection: inbound
//! text frames are decoded and dispatched to the room service, outbound
//! frames are drained from this connection's queue. When the socket
//! closes, for any reason, the connection's sessions are cleaned up as
//! if it had left every room it was in.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages;
use crate::domain::ConnectionHandle;
use crate::service::RoomService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Decodes envelopes from the client and dispatches them; invalid
///   envelopes are dropped with a log entry and no reply.
/// - Forwards frames enqueued by handlers and room fan-out to the client.
pub async fn run_connection(
    socket: WebSocket,
    room_service: Arc<RoomService>,
    queue_capacity: usize,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = ConnectionHandle::channel(queue_capacity);
    tracing::debug!(connection = %handle.id(), "ws connection opened");

    loop {
        tokio::select! {
            // Frame enqueued for this connection
            frame = outbound_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if ws_tx.send(Message::text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match messages::decode(&text) {
                            Ok(request) => {
                                tracing::debug!(
                                    connection = %handle.id(),
                                    msg_type = request.type_str(),
                                    "dispatching envelope"
                                );
                                room_service.handle(request, &handle).await;
                            }
                            Err(error) => {
                                tracing::warn!(
                                    connection = %handle.id(),
                                    %error,
                                    "dropping invalid envelope"
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    // Abrupt disconnects never send leave-room; reclaim the sessions here.
    room_service.handle_disconnect(handle.id()).await;
    tracing::debug!(connection = %handle.id(), "ws connection closed");
}
