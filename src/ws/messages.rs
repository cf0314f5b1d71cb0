//! Envelope protocol: client requests, server events, and decoding.
//!
//! Every frame in both directions is an envelope `{type, payLoad}`.
//! Inbound envelopes are decoded in two stages so that a malformed
//! envelope (bad JSON, missing `type`/`payLoad`) is distinguished from a
//! known type whose payload fails its required-field contract. Both are
//! dropped by the connection loop; the distinction only affects logging.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::RoomId;
use crate::domain::room::DEFAULT_ROOM_NAME;
use crate::error::GatewayError;

/// First decode stage: the untyped envelope shell.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(rename = "payLoad")]
    pay_load: Value,
}

/// A validated client request, one variant per envelope type.
///
/// Field contracts are enforced by [`decode`]; a constructed value is
/// guaranteed to carry non-empty identifiers and a positive cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    /// `create` — open (or replace) a room and seat the creator.
    Create {
        /// Client-chosen room identifier.
        room_id: RoomId,
        /// Username of the creator.
        username: String,
        /// Display name, defaulted when omitted.
        room_name: String,
        /// Cap on distinct membership.
        max_users: u32,
    },
    /// `join` — attach a connection to an existing room.
    Join {
        /// Target room.
        room_id: RoomId,
        /// Username asserted by the client.
        username: String,
    },
    /// `msg` — relay a chat line to the rest of the room.
    Chat {
        /// Target room.
        room_id: RoomId,
        /// Username asserted by the client.
        username: String,
        /// Chat text.
        text: String,
    },
    /// `request-room-info` — list the rooms a user belongs to.
    RequestRoomInfo {
        /// Username to look up.
        username: String,
    },
    /// `leave-room` — detach this connection's session from a room.
    LeaveRoom {
        /// Target room.
        room_id: RoomId,
        /// Username asserted by the client.
        username: String,
    },
}

impl ClientRequest {
    /// Returns the wire name of this request's envelope type.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Join { .. } => "join",
            Self::Chat { .. } => "msg",
            Self::RequestRoomInfo { .. } => "request-room-info",
            Self::LeaveRoom { .. } => "leave-room",
        }
    }
}

/// Serializable snapshot of a room for `room-info` and room listings.
pub use crate::domain::RoomInfo;

/// A server-to-client envelope, one variant per event type.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payLoad")]
pub enum ServerEvent {
    /// Full room snapshot, sent to a creating or joining connection.
    #[serde(rename = "room-info")]
    RoomInfo(RoomInfo),

    /// A new distinct member joined; sent to every session in the room.
    #[serde(rename = "new-user-joined", rename_all = "camelCase")]
    NewUserJoined {
        /// Room the member joined.
        room_id: RoomId,
        /// Username of the new member.
        new_member: String,
        /// Distinct member count after the join.
        user_count: usize,
        /// Distinct member usernames after the join.
        members: Vec<String>,
    },

    /// Chat line relayed to the room.
    #[serde(rename = "msg")]
    Chat {
        /// Username of the sender.
        username: String,
        /// Chat text.
        text: String,
        /// Server-assigned wall-clock time, `HH:MM` 24-hour.
        timestamp: String,
    },

    /// Request-level error reported back to the requester.
    #[serde(rename = "error", rename_all = "camelCase")]
    Error {
        /// Human-readable error message.
        error_message: String,
    },

    /// A distinct member left; sent to the remaining sessions.
    #[serde(rename = "user-left", rename_all = "camelCase")]
    UserLeft {
        /// Room the member left.
        room_id: RoomId,
        /// Username of the departed member.
        username: String,
        /// Distinct member count after the departure.
        user_count: usize,
        /// Distinct member usernames after the departure.
        members: Vec<String>,
    },

    /// Confirmation that a `leave-room` was processed.
    #[serde(rename = "room-data-updated", rename_all = "camelCase")]
    RoomDataUpdated {
        /// Room the confirmation refers to.
        room_id: RoomId,
        /// Human-readable status line.
        message: String,
    },

    /// Reply to `request-room-info`: the rooms the user belongs to.
    #[serde(rename = "request-room-info")]
    RoomList(Vec<RoomInfo>),
}

/// Decodes and validates one inbound text frame.
///
/// # Errors
///
/// - [`GatewayError::MalformedEnvelope`] when the frame is not JSON, or
///   lacks `type` or an object `payLoad`.
/// - [`GatewayError::UnknownType`] when `type` names no known request.
/// - [`GatewayError::MissingField`] when a required payload field is
///   missing, empty, or (for `maxUsers`) not a positive integer. Empty
///   strings count as missing.
pub fn decode(text: &str) -> Result<ClientRequest, GatewayError> {
    let envelope: RawEnvelope = serde_json::from_str(text)
        .map_err(|e| GatewayError::MalformedEnvelope(e.to_string()))?;
    if !envelope.pay_load.is_object() {
        return Err(GatewayError::MalformedEnvelope(
            "payLoad must be an object".to_string(),
        ));
    }
    let payload = &envelope.pay_load;

    match envelope.msg_type.as_str() {
        "create" => Ok(ClientRequest::Create {
            room_id: RoomId::new(require_str(payload, "create", "roomId")?),
            username: require_str(payload, "create", "username")?,
            room_name: optional_str(payload, "roomName")
                .unwrap_or_else(|| DEFAULT_ROOM_NAME.to_string()),
            max_users: require_positive(payload, "create", "maxUsers")?,
        }),
        "join" => Ok(ClientRequest::Join {
            room_id: RoomId::new(require_str(payload, "join", "roomId")?),
            username: require_str(payload, "join", "username")?,
        }),
        "msg" => Ok(ClientRequest::Chat {
            room_id: RoomId::new(require_str(payload, "msg", "roomId")?),
            username: require_str(payload, "msg", "username")?,
            text: require_str(payload, "msg", "text")?,
        }),
        "request-room-info" => Ok(ClientRequest::RequestRoomInfo {
            username: require_str(payload, "request-room-info", "username")?,
        }),
        "leave-room" => Ok(ClientRequest::LeaveRoom {
            room_id: RoomId::new(require_str(payload, "leave-room", "roomId")?),
            username: require_str(payload, "leave-room", "username")?,
        }),
        other => Err(GatewayError::UnknownType(other.to_string())),
    }
}

/// Extracts a required non-empty string field.
fn require_str(
    payload: &Value,
    msg_type: &'static str,
    field: &'static str,
) -> Result<String, GatewayError> {
    match payload.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(GatewayError::MissingField { msg_type, field }),
    }
}

/// Extracts an optional non-empty string field.
fn optional_str(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Extracts a required positive integer field. Zero counts as missing.
fn require_positive(
    payload: &Value,
    msg_type: &'static str,
    field: &'static str,
) -> Result<u32, GatewayError> {
    match payload.get(field).and_then(Value::as_u64) {
        Some(n) if n > 0 => Ok(u32::try_from(n).unwrap_or(u32::MAX)),
        _ => Err(GatewayError::MissingField { msg_type, field }),
    }
}
