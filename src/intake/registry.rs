//! Concurrent per-owner session storage with TTL eviction.
//!
//! [`SessionRegistry`] keeps each live intake conversation behind its own
//! lock: the outer map is a `RwLock<HashMap>` and every entry an
//! `Arc<Mutex<IntakeSession>>`, so distinct owners never contend and a
//! single owner's events are serialized even if the transport delivers
//! them concurrently. Entries idle past the TTL are dropped on access,
//! bounding the map for abandoned conversations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use super::session::IntakeSession;
use crate::domain::OwnerId;

/// Central store for live intake sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<OwnerId, Arc<Mutex<IntakeSession>>>>,
    ttl: Duration,
}

impl SessionRegistry {
    /// Creates an empty registry with the given idle TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Opens (or replaces) the owner's session and returns its lock.
    pub async fn begin(&self, owner: OwnerId, session: IntakeSession) -> Arc<Mutex<IntakeSession>> {
        self.evict_stale().await;
        let entry = Arc::new(Mutex::new(session));
        let mut map = self.sessions.write().await;
        map.insert(owner, Arc::clone(&entry));
        entry
    }

    /// Returns the owner's session lock, if a live one exists.
    pub async fn get(&self, owner: &OwnerId) -> Option<Arc<Mutex<IntakeSession>>> {
        self.evict_stale().await;
        let map = self.sessions.read().await;
        map.get(owner).cloned()
    }

    /// Drops the owner's session. Returns `true` when one existed.
    pub async fn remove(&self, owner: &OwnerId) -> bool {
        let mut map = self.sessions.write().await;
        map.remove(owner).is_some()
    }

    /// Drops every entry idle past the TTL. Entries currently locked are
    /// in active use and kept.
    pub async fn evict_stale(&self) {
        let ttl = self.ttl;
        let mut map = self.sessions.write().await;
        map.retain(|owner, entry| match entry.try_lock() {
            Ok(session) => {
                let keep = session.idle_for() < ttl;
                if !keep {
                    tracing::debug!(%owner, "evicting stale intake session");
                }
                keep
            }
            Err(_) => true,
        });
    }

    /// Returns the number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
