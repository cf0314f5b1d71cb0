//! roomcast server entry point.
//!
//! Starts the Axum HTTP server with the health and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomcast::api;
use roomcast::app_state::AppState;
use roomcast::config::GatewayConfig;
use roomcast::domain::RoomRegistry;
use roomcast::service::RoomService;
use roomcast::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting roomcast");

    // Build domain and service layers
    let registry = Arc::new(RoomRegistry::new());
    let room_service = Arc::new(RoomService::new(registry));

    // Build application state
    let app_state = AppState {
        room_service,
        outbound_queue_capacity: config.outbound_queue_capacity,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
