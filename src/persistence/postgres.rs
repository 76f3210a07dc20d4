//! PostgreSQL implementation of the request store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use super::RequestStore;
use super::models::{RequestRow, place_choice_column};
use crate::config::BotConfig;
use crate::domain::{
    ExchangeRequest, NewRequest, OwnerId, RequestId, generate_verification_code,
};
use crate::error::ExchangeError;

/// Columns selected for every full-row read, in [`RequestRow`] order.
const COLUMNS: &str = "id, owner_id, contact, order_no, phone, email, \
     orig_date, orig_slot, orig_place, desired_dates, desired_slots, \
     desired_place, verification_code, status, match_group, created_at";

/// PostgreSQL-backed request store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool using the configuration's sizing knobs.
    ///
    /// # Errors
    ///
    /// Returns a [`ExchangeError::Persistence`] when the pool cannot be
    /// established.
    pub async fn connect(config: &BotConfig, database_url: &str) -> Result<Self, ExchangeError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(database_url)
            .await
            .map_err(|e| ExchangeError::Persistence(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Creates the `exchange_requests` table when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [`ExchangeError::Persistence`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), ExchangeError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS exchange_requests (
                id BIGSERIAL PRIMARY KEY,
                owner_id TEXT NOT NULL,
                contact TEXT NOT NULL,
                order_no TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT NOT NULL,
                orig_date TEXT NOT NULL,
                orig_slot TEXT NOT NULL,
                orig_place TEXT NOT NULL,
                desired_dates TEXT[] NOT NULL,
                desired_slots TEXT[] NOT NULL,
                desired_place TEXT NOT NULL,
                verification_code TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                match_group BIGINT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;
        Ok(())
    }
}

/// Decodes one full row into the domain entity.
fn decode(row: &PgRow) -> Result<ExchangeRequest, ExchangeError> {
    let db = |e: sqlx::Error| ExchangeError::Persistence(e.to_string());
    RequestRow {
        id: row.try_get("id").map_err(db)?,
        owner_id: row.try_get("owner_id").map_err(db)?,
        contact: row.try_get("contact").map_err(db)?,
        order_no: row.try_get("order_no").map_err(db)?,
        phone: row.try_get("phone").map_err(db)?,
        email: row.try_get("email").map_err(db)?,
        orig_date: row.try_get("orig_date").map_err(db)?,
        orig_slot: row.try_get("orig_slot").map_err(db)?,
        orig_place: row.try_get("orig_place").map_err(db)?,
        desired_dates: row.try_get("desired_dates").map_err(db)?,
        desired_slots: row.try_get("desired_slots").map_err(db)?,
        desired_place: row.try_get("desired_place").map_err(db)?,
        verification_code: row.try_get("verification_code").map_err(db)?,
        status: row.try_get("status").map_err(db)?,
        match_group: row.try_get("match_group").map_err(db)?,
        created_at: row.try_get("created_at").map_err(db)?,
    }
    .into_domain()
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(&self, new: NewRequest) -> Result<ExchangeRequest, ExchangeError> {
        let verification_code = generate_verification_code();
        let desired_dates: Vec<String> = new
            .desired
            .iter()
            .map(|d| d.date.as_str().to_string())
            .collect();
        let desired_slots: Vec<String> = new
            .desired
            .iter()
            .map(|d| d.slot.as_str().to_string())
            .collect();
        let desired_place = new
            .desired
            .first()
            .map(|d| place_choice_column(&d.place))
            .ok_or_else(|| {
                ExchangeError::Persistence("insert with empty desired list".to_string())
            })?;

        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO exchange_requests \
             (owner_id, contact, order_no, phone, email, orig_date, orig_slot, orig_place, \
              desired_dates, desired_slots, desired_place, verification_code, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending') \
             RETURNING id, created_at",
        )
        .bind(new.owner.as_str())
        .bind(&new.contact)
        .bind(&new.order_no)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.original.date.as_str())
        .bind(new.original.slot.as_str())
        .bind(new.original.place.as_str())
        .bind(&desired_dates)
        .bind(&desired_slots)
        .bind(&desired_place)
        .bind(&verification_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        Ok(ExchangeRequest {
            id: RequestId::new(id),
            owner: new.owner,
            contact: new.contact,
            order_no: new.order_no,
            phone: new.phone,
            email: new.email,
            original: new.original,
            desired: new.desired,
            verification_code,
            status: crate::domain::RequestStatus::Pending,
            match_group: None,
            created_at,
        })
    }

    async fn get_by_id(&self, id: RequestId) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM exchange_requests WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        row.as_ref().map(decode).transpose()
    }

    async fn get_by_owner_order_code(
        &self,
        owner: &OwnerId,
        order_no: &str,
        code: &str,
    ) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM exchange_requests \
             WHERE owner_id = $1 AND order_no = $2 AND verification_code = $3 \
             ORDER BY id DESC LIMIT 1"
        ))
        .bind(owner.as_str())
        .bind(order_no)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        row.as_ref().map(decode).transpose()
    }

    async fn latest_pending_for_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM exchange_requests \
             WHERE owner_id = $1 AND status = 'pending' \
             ORDER BY id DESC LIMIT 1"
        ))
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        row.as_ref().map(decode).transpose()
    }

    async fn delete_if_pending(&self, id: RequestId) -> Result<u64, ExchangeError> {
        let result =
            sqlx::query("DELETE FROM exchange_requests WHERE id = $1 AND status = 'pending'")
                .bind(id.as_i64())
                .execute(&self.pool)
                .await
                .map_err(|e| ExchangeError::Persistence(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn order_no_exists(
        &self,
        owner: &OwnerId,
        order_no: &str,
    ) -> Result<bool, ExchangeError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM exchange_requests WHERE owner_id = $1 AND order_no = $2)",
        )
        .bind(owner.as_str())
        .bind(order_no)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))
    }

    async fn pending_candidates(
        &self,
        exclude: &OwnerId,
    ) -> Result<Vec<ExchangeRequest>, ExchangeError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM exchange_requests \
             WHERE status = 'pending' AND owner_id <> $1 \
             ORDER BY id ASC"
        ))
        .bind(exclude.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        rows.iter().map(decode).collect()
    }

    async fn match_partner(
        &self,
        of: &ExchangeRequest,
    ) -> Result<Option<ExchangeRequest>, ExchangeError> {
        let Some(group) = of.match_group else {
            return Ok(None);
        };
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM exchange_requests \
             WHERE match_group = $1 AND id <> $2"
        ))
        .bind(group.as_i64())
        .bind(of.id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        row.as_ref().map(decode).transpose()
    }

    async fn commit_match(
        &self,
        a: RequestId,
        b: RequestId,
        group: RequestId,
    ) -> Result<(), ExchangeError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        // Conditional on both rows still being pending: a concurrent
        // claim makes rows_affected come up short and the whole update
        // is rolled back.
        let result = sqlx::query(
            "UPDATE exchange_requests \
             SET status = 'matched', match_group = $1 \
             WHERE id IN ($2, $3) AND status = 'pending'",
        )
        .bind(group.as_i64())
        .bind(a.as_i64())
        .bind(b.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        if result.rows_affected() != 2 {
            tx.rollback()
                .await
                .map_err(|e| ExchangeError::Persistence(e.to_string()))?;
            return Err(ExchangeError::MatchConflict);
        }

        tx.commit()
            .await
            .map_err(|e| ExchangeError::Persistence(e.to_string()))?;
        Ok(())
    }
}
