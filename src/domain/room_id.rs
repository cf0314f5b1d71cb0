//! Type-safe room identifier.
//!
//! [`RoomId`] is a newtype wrapper around the client-supplied room key
//! string, providing type safety so room keys cannot be confused with
//! usernames or other strings flowing through the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a room.
///
/// Supplied by the client at room creation and treated as the sole
/// identity of the room. Used as the dictionary key in
/// [`super::RoomRegistry`] and echoed back in every room-scoped event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a `RoomId` from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_input() {
        let id = RoomId::new("ABC123");
        assert_eq!(format!("{id}"), "ABC123");
        assert_eq!(id.as_str(), "ABC123");
    }

    #[test]
    fn serde_is_transparent() {
        let id = RoomId::new("ABC123");
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"ABC123\"");
        let back: Option<RoomId> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(id));
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = RoomId::new("ABC123");
        let mut map = HashMap::new();
        map.insert(id.clone(), "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
