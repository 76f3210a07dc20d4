//! Match engine: pairs a pending request with the oldest compatible
//! counterpart and commits the pairing atomically.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ExchangeRequest, RequestId, compat};
use crate::error::ExchangeError;
use crate::notify::Notifier;
use crate::persistence::RequestStore;

/// Serialized search-and-commit over pending requests.
///
/// The scan and the two-row commit run inside a single engine-level
/// critical section, so two concurrently triggered matches can never
/// select the same counterpart. The commit itself is additionally
/// conditional on both rows still being pending, which keeps the
/// no-double-claim guarantee even when several service instances share
/// one database; a lost race simply re-runs the scan.
#[derive(Debug)]
pub struct MatchEngine {
    store: Arc<dyn RequestStore>,
    notifier: Arc<dyn Notifier>,
    gate: Mutex<()>,
}

impl MatchEngine {
    /// Creates a new `MatchEngine`.
    #[must_use]
    pub fn new(store: Arc<dyn RequestStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            gate: Mutex::new(()),
        }
    }

    /// Attempts to pair the given request.
    ///
    /// A request that no longer exists or is no longer pending is a
    /// no-op, not an error: it was cancelled or already claimed. Returns
    /// the shared match group when a pairing was committed.
    ///
    /// Both owners are notified after the commit; delivery failure is
    /// logged and never rolls the pairing back; the stored match is the
    /// source of truth and the query command recovers the details.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Persistence`] on storage failure.
    pub async fn try_match(&self, id: RequestId) -> Result<Option<RequestId>, ExchangeError> {
        let _serial = self.gate.lock().await;
        loop {
            let Some(me) = self.store.get_by_id(id).await? else {
                return Ok(None);
            };
            if !me.is_pending() {
                return Ok(None);
            }

            let candidates = self.store.pending_candidates(&me.owner).await?;
            let Some(partner) = candidates
                .into_iter()
                .find(|c| compat::mutually_compatible(&me, c))
            else {
                return Ok(None);
            };

            let group = RequestId::group_of(me.id, partner.id);
            match self.store.commit_match(me.id, partner.id, group).await {
                Ok(()) => {
                    tracing::info!(%group, mine = %me.id, partner = %partner.id, "requests matched");
                    self.notify_matched(&me, &partner).await;
                    self.notify_matched(&partner, &me).await;
                    return Ok(Some(group));
                }
                Err(ExchangeError::MatchConflict) => {
                    tracing::debug!(mine = %me.id, partner = %partner.id, "pairing raced, rescanning");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Best-effort push of the match notice to one side of the pair.
    async fn notify_matched(&self, to: &ExchangeRequest, partner: &ExchangeRequest) {
        let text = format!(
            "A swap counterpart was found for order {}.\n{}",
            to.order_no,
            counterpart_summary(partner)
        );
        if let Err(e) = self.notifier.push(&to.owner, &text).await {
            tracing::warn!(owner = %to.owner, error = %e, "match notification failed");
        }
    }
}

/// Renders the public fields of a matched counterpart: contact details
/// plus the assignment they hold (which is what the recipient will take
/// over).
#[must_use]
pub fn counterpart_summary(partner: &ExchangeRequest) -> String {
    format!(
        "Counterpart contact: {}\nPhone: {}\nEmail: {}\nThey hold: {} {} at {}",
        partner.contact,
        partner.phone,
        partner.email,
        partner.original.date,
        partner.original.slot,
        partner.original.place
    )
}
