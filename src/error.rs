//! Gateway error types with wire-reply mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Most
//! failures are dropped with a log entry and no reply; the two
//! room-state errors that the protocol surfaces to clients map to an
//! `error` envelope via [`GatewayError::client_message`].

use crate::domain::RoomId;

/// Server-side error enum for envelope handling.
///
/// # Error taxonomy
///
/// | Variant              | Category   | Wire behavior                  |
/// |----------------------|------------|--------------------------------|
/// | `MalformedEnvelope`  | Protocol   | drop + log                     |
/// | `MissingField`       | Validation | drop + log                     |
/// | `UnknownType`        | Protocol   | drop + log                     |
/// | `RoomNotFound`       | State      | `error` envelope on `join`     |
/// | `RoomFull`           | State      | `error` envelope on `join`     |
///
/// No error is fatal to the connection or the process; failures are
/// isolated per message and per room.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Envelope was not valid JSON or lacked `type`/`payLoad`.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A required field for the given message type was missing or empty.
    #[error("missing field `{field}` in `{msg_type}` message")]
    MissingField {
        /// Envelope type the payload belonged to.
        msg_type: &'static str,
        /// Name of the missing or empty field.
        field: &'static str,
    },

    /// Envelope `type` did not name a known request.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// No room exists under the given identifier.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The room's distinct membership is at its cap.
    #[error("room is full: {0}")]
    RoomFull(RoomId),
}

impl GatewayError {
    /// Returns the client-facing error message, if this error is one the
    /// protocol reports back instead of silently dropping.
    #[must_use]
    pub const fn client_message(&self) -> Option<&'static str> {
        match self {
            Self::RoomNotFound(_) => Some("Room not found"),
            Self::RoomFull(_) => Some("Room is full"),
            Self::MalformedEnvelope(_) | Self::MissingField { .. } | Self::UnknownType(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_have_client_messages() {
        let id = RoomId::new("ABC123");
        assert_eq!(
            GatewayError::RoomNotFound(id.clone()).client_message(),
            Some("Room not found")
        );
        assert_eq!(
            GatewayError::RoomFull(id).client_message(),
            Some("Room is full")
        );
    }

    #[test]
    fn protocol_errors_are_silent() {
        assert!(
            GatewayError::MalformedEnvelope("bad json".to_string())
                .client_message()
                .is_none()
        );
        assert!(
            GatewayError::MissingField {
                msg_type: "create",
                field: "roomId"
            }
            .client_message()
            .is_none()
        );
        assert!(
            GatewayError::UnknownType("ping".to_string())
                .client_message()
                .is_none()
        );
    }
}
