//! HTTP boundary: the webhook endpoint, event payloads, and router
//! composition.
//!
//! The conversational surface lives behind `POST /callback`; `GET
//! /health` is the only other route.

pub mod events;
pub mod system;
pub mod webhook;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete router.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(webhook::routes())
        .merge(system::routes())
}
