//! Opaque requester identity.
//!
//! [`OwnerId`] wraps the messaging platform's stable user identifier. The
//! core never interprets it; it only keys sessions and scopes lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a conversational participant.
///
/// One owner maps to one messaging-platform user. Used as the session
/// registry key and as the scope for order-number uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an `OwnerId` from the transport's sender identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_identities_are_unequal() {
        assert_ne!(OwnerId::new("U1"), OwnerId::new("U2"));
        assert_eq!(OwnerId::new("U1"), OwnerId::new("U1"));
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = OwnerId::new("U1");
        let mut map = HashMap::new();
        map.insert(id.clone(), "session");
        assert_eq!(map.get(&id), Some(&"session"));
    }

    #[test]
    fn display_is_raw_identity() {
        assert_eq!(format!("{}", OwnerId::new("U42")), "U42");
    }
}
