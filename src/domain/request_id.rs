//! Type-safe exchange request identifier.
//!
//! [`RequestId`] is a newtype wrapper around the store's monotonically
//! increasing row id, providing type safety so that request identifiers
//! cannot be confused with other integers (e.g. match group ids are also
//! request ids, namely the smaller of the pair).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an exchange request.
///
/// Assigned by the store on insertion and monotonically increasing, so
/// ascending id order is insertion order. The match tie-break ("oldest
/// pending candidate first") relies on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(i64);

impl RequestId {
    /// Creates a `RequestId` from a raw row id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns the smaller of two ids; the match group identifier shared
    /// by a pair of matched requests.
    #[must_use]
    pub fn group_of(a: Self, b: Self) -> Self {
        a.min(b)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RequestId> for i64 {
    fn from(id: RequestId) -> Self {
        id.0
    }
}
