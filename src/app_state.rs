//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::RoomService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Room service for all envelope handling.
    pub room_service: Arc<RoomService>,
    /// Capacity of each connection's outbound frame queue.
    pub outbound_queue_capacity: usize,
}
