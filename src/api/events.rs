//! Inbound webhook event payloads.
//!
//! Only the slice of the messaging platform's event schema the service
//! consumes: text messages with a sender and a reply token. Everything
//! else deserializes fine and is skipped by the handler.

use serde::Deserialize;

/// Top-level webhook payload: a batch of events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Events delivered in this call.
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event discriminator (`"message"`, `"follow"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// One-shot token for replying to this event.
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    /// Who triggered the event.
    pub source: Option<EventSource>,
    /// The message, when `kind` is `"message"`.
    pub message: Option<EventMessage>,
}

/// Sender of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSource {
    /// Source discriminator (`"user"`, `"group"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Stable user identity; the owner key.
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Message content of a message event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    /// Message discriminator (`"text"`, `"sticker"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Text content, when `kind` is `"text"`.
    pub text: Option<String>,
}
