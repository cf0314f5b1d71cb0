//! # roomcast
//!
//! WebSocket gateway for ephemeral multi-party chat rooms.
//!
//! Tracks which users (possibly holding several simultaneous
//! connections) belong to which room, enforces per-room capacity, and
//! fans chat and presence events out to the right connections. Rooms
//! live entirely in process memory and disappear when their last
//! session leaves.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── WS upgrade + connection loop (ws/)
//!     │       envelope decode, outbound queue drain
//!     │
//!     ├── RoomService (service/)
//!     │       one handler per envelope type, fan-out
//!     │
//!     └── RoomRegistry (domain/)
//!             per-room locks, sessions, membership
//! ```
//!
//! Identity is whatever username the client asserts; an upstream
//! authentication service is trusted to have vetted it.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
