//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::notify::Notifier;
use crate::service::IntakeService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Conversation orchestrator for all inbound text.
    pub intake: Arc<IntakeService>,
    /// Outbound delivery, used for the per-event reply.
    pub notifier: Arc<dyn Notifier>,
    /// Channel secret for webhook signature verification.
    pub channel_secret: String,
}
