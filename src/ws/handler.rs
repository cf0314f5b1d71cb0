//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let room_service = std::sync::Arc::clone(&state.room_service);
    let capacity = state.outbound_queue_capacity;

    ws.on_upgrade(move |socket| run_connection(socket, room_service, capacity))
}
