//! Outbound delivery: reply-to-event and push-to-owner.
//!
//! Delivery is best-effort everywhere it is used: a committed match is
//! the durable source of truth and a lost push is recoverable through
//! the query command, so senders log failures and move on.

pub mod line;

use async_trait::async_trait;

use crate::domain::OwnerId;
use crate::error::ExchangeError;

pub use line::LineNotifier;

/// Message delivery back to conversational participants.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Replies to the inbound event that carried `reply_token`. Usable at
    /// most once per event; the webhook layer enforces that by replying
    /// exactly once per handled message.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Notification`] on delivery failure.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ExchangeError>;

    /// Pushes a message to an owner, independent of any inbound event.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Notification`] on delivery failure.
    async fn push(&self, owner: &OwnerId, text: &str) -> Result<(), ExchangeError>;
}

/// Log-only notifier for tests and local runs without channel
/// credentials.
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ExchangeError> {
        tracing::debug!(reply_token, text, "reply suppressed (noop notifier)");
        Ok(())
    }

    async fn push(&self, owner: &OwnerId, text: &str) -> Result<(), ExchangeError> {
        tracing::debug!(%owner, text, "push suppressed (noop notifier)");
        Ok(())
    }
}
