//! WebSocket layer: upgrade handling, the per-connection loop, and the
//! envelope protocol.
//!
//! The WebSocket endpoint at `/ws` carries all room traffic. Each
//! connection runs one loop that drains its outbound queue and
//! dispatches inbound envelopes to the room service.

pub mod connection;
pub mod handler;
pub mod messages;
