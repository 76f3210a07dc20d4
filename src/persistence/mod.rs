//! Persistence layer: the request store contract and its backends.
//!
//! [`RequestStore`] is the seam between the core and durable storage.
//! The PostgreSQL backend is the production path; the in-memory backend
//! serves tests and database-less local runs. Both uphold the same
//! contract, most importantly `commit_match`: the two-row pairing update
//! succeeds only if both rows are still pending, and fails with
//! [`crate::error::ExchangeError::MatchConflict`] otherwise.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{ExchangeRequest, NewRequest, OwnerId, RequestId};
use crate::error::ExchangeError;

/// CRUD over request records plus the atomic pairing update.
#[async_trait]
pub trait RequestStore: Send + Sync + std::fmt::Debug {
    /// Stores a fully validated request, assigning its id and
    /// verification code. The record is written whole or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn insert(&self, new: NewRequest) -> Result<ExchangeRequest, ExchangeError>;

    /// Fetches a request by id.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn get_by_id(&self, id: RequestId) -> Result<Option<ExchangeRequest>, ExchangeError>;

    /// Fetches the owner's latest request carrying this order number and
    /// verification code. A non-matching code yields `None`; nothing is
    /// revealed about records under other codes or owners.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn get_by_owner_order_code(
        &self,
        owner: &OwnerId,
        order_no: &str,
        code: &str,
    ) -> Result<Option<ExchangeRequest>, ExchangeError>;

    /// Fetches the owner's most recently inserted pending request.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn latest_pending_for_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Option<ExchangeRequest>, ExchangeError>;

    /// Deletes the request only while it is still pending. Returns the
    /// number of rows removed (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn delete_if_pending(&self, id: RequestId) -> Result<u64, ExchangeError>;

    /// Whether the owner already has a request under this order number.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn order_no_exists(
        &self,
        owner: &OwnerId,
        order_no: &str,
    ) -> Result<bool, ExchangeError>;

    /// All pending requests of other owners, in ascending id order
    /// (insertion order; the FIFO tie-break depends on it).
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn pending_candidates(
        &self,
        exclude: &OwnerId,
    ) -> Result<Vec<ExchangeRequest>, ExchangeError>;

    /// The other request in a matched pair, located via the shared match
    /// group. `None` while the request is unmatched.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    async fn match_partner(
        &self,
        of: &ExchangeRequest,
    ) -> Result<Option<ExchangeRequest>, ExchangeError>;

    /// Atomically marks both requests matched and stamps the shared
    /// group, but only while both rows are still pending.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::MatchConflict`] when either row was
    /// claimed or removed concurrently (the caller should re-run its
    /// search), or [`ExchangeError::Persistence`] on storage failure.
    async fn commit_match(
        &self,
        a: RequestId,
        b: RequestId,
        group: RequestId,
    ) -> Result<(), ExchangeError>;
}
