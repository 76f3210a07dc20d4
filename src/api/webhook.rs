//! Webhook endpoint: signature verification and event dispatch.
//!
//! `POST /callback` is the single inbound surface. The channel signature
//! is verified over the raw body before anything is parsed; a bad
//! signature is rejected with 400 and never reaches the core. Each text
//! message event is handed to the intake service and answered through
//! the one-shot reply token.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::events::{WebhookEvent, WebhookPayload};
use crate::app_state::AppState;
use crate::domain::OwnerId;
use crate::error::ExchangeError;

/// `POST /callback` — inbound webhook.
///
/// # Errors
///
/// Returns [`ExchangeError::InvalidSignature`] or
/// [`ExchangeError::InvalidPayload`] at the boundary, and propagates
/// [`ExchangeError::Persistence`] from the core.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ExchangeError> {
    let provided = headers
        .get("x-line-signature")
        .and_then(|value| value.to_str().ok());
    verify_signature(&state.channel_secret, provided, &body)?;

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ExchangeError::InvalidPayload(e.to_string()))?;

    for event in payload.events {
        handle_event(&state, event).await?;
    }
    Ok("OK")
}

/// Dispatches one event; non-text events are skipped silently.
async fn handle_event(state: &AppState, event: WebhookEvent) -> Result<(), ExchangeError> {
    if event.kind != "message" {
        return Ok(());
    }
    let Some(text) = event
        .message
        .filter(|m| m.kind == "text")
        .and_then(|m| m.text)
    else {
        return Ok(());
    };
    let Some(user_id) = event.source.and_then(|s| s.user_id) else {
        return Ok(());
    };

    let owner = OwnerId::new(user_id);
    let reply = state.intake.handle_text(&owner, &text).await?;

    // One reply per inbound event; losing it is recoverable through the
    // query command, so a delivery failure only gets logged.
    if let Some(token) = event.reply_token {
        if let Err(e) = state.notifier.reply(&token, &reply).await {
            tracing::warn!(%owner, error = %e, "reply delivery failed");
        }
    }
    Ok(())
}

/// Verifies the channel signature: base64 of HMAC-SHA256 over the raw
/// body, compared in constant time. An empty secret disables the check
/// for local runs.
///
/// # Errors
///
/// Returns [`ExchangeError::InvalidSignature`] when the header is
/// missing, unparseable, or does not match.
pub fn verify_signature(
    secret: &str,
    provided: Option<&str>,
    body: &[u8],
) -> Result<(), ExchangeError> {
    if secret.is_empty() {
        tracing::warn!("channel secret unset; accepting webhook without signature check");
        return Ok(());
    }
    let Some(provided) = provided else {
        return Err(ExchangeError::InvalidSignature);
    };

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| ExchangeError::InvalidSignature)?;
    mac.update(body);
    let expected = STANDARD.encode(mac.finalize().into_bytes());

    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        Err(ExchangeError::InvalidSignature)
    }
}

/// Webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/callback", post(callback))
}
