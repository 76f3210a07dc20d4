//! The exchange request entity and its lifecycle states.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::assignment::{Assignment, DesiredAssignment};
use super::owner::OwnerId;
use super::request_id::RequestId;

/// Lifecycle state of a stored request.
///
/// The only transition is `Pending` → `Matched`, applied to exactly two
/// rows together by the pairing transaction. A `Matched` request is
/// immutable and can never be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Stored, no counterpart yet; eligible for matching and cancellation.
    Pending,
    /// Permanently paired with exactly one counterpart.
    Matched,
}

impl RequestStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
        }
    }

    /// Parses the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "matched" => Some(Self::Matched),
            _ => None,
        }
    }
}

/// A fully validated submission, ready for insertion.
///
/// Everything the store does not generate itself: the owner, the contact
/// fields, and the normalized assignments. `desired` is non-empty and its
/// length is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    /// Requester identity.
    pub owner: OwnerId,
    /// Contact name.
    pub contact: String,
    /// Normalized 9-digit order number, unique per owner.
    pub order_no: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// The assignment currently held.
    pub original: Assignment,
    /// Acceptable swap targets, in submission order.
    pub desired: Vec<DesiredAssignment>,
}

/// A stored exchange request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Store-assigned monotonic id.
    pub id: RequestId,
    /// Requester identity.
    pub owner: OwnerId,
    /// Contact name.
    pub contact: String,
    /// Normalized 9-digit order number.
    pub order_no: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// The assignment currently held.
    pub original: Assignment,
    /// Acceptable swap targets, in submission order. Never empty.
    pub desired: Vec<DesiredAssignment>,
    /// Owner-proof token assigned at creation, required for cancel/query.
    pub verification_code: String,
    /// Lifecycle state.
    pub status: RequestStatus,
    /// Shared pair identifier once matched; the smaller of the two ids.
    pub match_group: Option<RequestId>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ExchangeRequest {
    /// Returns `true` while the request is eligible for matching and
    /// cancellation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Generates a random 6-digit verification code.
///
/// No cross-request uniqueness is enforced: every lookup is scoped by
/// owner + order number + code, so global collisions are harmless.
#[must_use]
pub fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    (0..6)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
