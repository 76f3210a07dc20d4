//! In-memory implementation of the request store.
//!
//! Backs tests and database-less local runs. A single mutex over the
//! whole table gives the same atomicity the Postgres transaction
//! provides for `commit_match`; ids are handed out by a monotonic
//! counter just like `BIGSERIAL`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::RequestStore;
use crate::domain::{
    ExchangeRequest, NewRequest, OwnerId, RequestId, RequestStatus, generate_verification_code,
};
use crate::error::ExchangeError;

/// Whole-table state behind the store mutex.
#[derive(Debug, Default)]
struct TableState {
    next_id: i64,
    rows: BTreeMap<i64, ExchangeRequest>,
}

/// Mutex-guarded in-memory request table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<TableState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert(&self, new: NewRequest) -> Result<ExchangeRequest, ExchangeError> {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let id = table.next_id;
        let request = ExchangeRequest {
            id: RequestId::new(id),
            owner: new.owner,
            contact: new.contact,
            order_no: new.order_no,
            phone: new.phone,
            email: new.email,
            original: new.original,
            desired: new.desired,
            verification_code: generate_verification_code(),
            status: RequestStatus::Pending,
            match_group: None,
            created_at: Utc::now(),
        };
        table.rows.insert(id, request.clone());
        Ok(request)
    }

    async fn get_by_id(&self, id: RequestId) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let table = self.table.lock().await;
        Ok(table.rows.get(&id.as_i64()).cloned())
    }

    async fn get_by_owner_order_code(
        &self,
        owner: &OwnerId,
        order_no: &str,
        code: &str,
    ) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .rev()
            .find(|r| {
                r.owner == *owner && r.order_no == order_no && r.verification_code == code
            })
            .cloned())
    }

    async fn latest_pending_for_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .rev()
            .find(|r| r.owner == *owner && r.is_pending())
            .cloned())
    }

    async fn delete_if_pending(&self, id: RequestId) -> Result<u64, ExchangeError> {
        let mut table = self.table.lock().await;
        let deletable = table
            .rows
            .get(&id.as_i64())
            .is_some_and(ExchangeRequest::is_pending);
        if deletable {
            table.rows.remove(&id.as_i64());
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn order_no_exists(
        &self,
        owner: &OwnerId,
        order_no: &str,
    ) -> Result<bool, ExchangeError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .any(|r| r.owner == *owner && r.order_no == order_no))
    }

    async fn pending_candidates(
        &self,
        exclude: &OwnerId,
    ) -> Result<Vec<ExchangeRequest>, ExchangeError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .filter(|r| r.is_pending() && r.owner != *exclude)
            .cloned()
            .collect())
    }

    async fn match_partner(
        &self,
        of: &ExchangeRequest,
    ) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let Some(group) = of.match_group else {
            return Ok(None);
        };
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .find(|r| r.match_group == Some(group) && r.id != of.id)
            .cloned())
    }

    async fn commit_match(
        &self,
        a: RequestId,
        b: RequestId,
        group: RequestId,
    ) -> Result<(), ExchangeError> {
        let mut table = self.table.lock().await;
        let both_pending = table
            .rows
            .get(&a.as_i64())
            .is_some_and(ExchangeRequest::is_pending)
            && table
                .rows
                .get(&b.as_i64())
                .is_some_and(ExchangeRequest::is_pending);
        if !both_pending {
            return Err(ExchangeError::MatchConflict);
        }
        for id in [a, b] {
            if let Some(row) = table.rows.get_mut(&id.as_i64()) {
                row.status = RequestStatus::Matched;
                row.match_group = Some(group);
            }
        }
        Ok(())
    }
}
