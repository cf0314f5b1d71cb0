//! Service layer: envelope dispatch and fan-out.
//!
//! [`RoomService`] coordinates room operations against the
//! [`crate::domain::RoomRegistry`] and delivers replies and broadcasts
//! through [`fanout`].

pub mod fanout;
pub mod room_service;

pub use room_service::RoomService;
