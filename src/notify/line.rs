//! LINE Messaging API notifier.
//!
//! Speaks the two delivery endpoints the service needs: `reply` (bound
//! to an inbound event's reply token) and `push` (addressed to a user
//! id). Authentication is the channel access token as a bearer header.

use async_trait::async_trait;
use serde::Serialize;

use super::Notifier;
use crate::domain::OwnerId;
use crate::error::ExchangeError;

const REPLY_ENDPOINT: &str = "https://api.line.me/v2/bot/message/reply";
const PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

/// One text message in an outbound payload.
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl<'a> TextMessage<'a> {
    fn new(text: &'a str) -> Self {
        Self { kind: "text", text }
    }
}

/// Reply API payload.
#[derive(Debug, Serialize)]
struct ReplyBody<'a> {
    #[serde(rename = "replyToken")]
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

/// Push API payload.
#[derive(Debug, Serialize)]
struct PushBody<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

/// Notifier delivering over the LINE Messaging API.
#[derive(Debug, Clone)]
pub struct LineNotifier {
    http: reqwest::Client,
    access_token: String,
}

impl LineNotifier {
    /// Creates a notifier with the given channel access token.
    #[must_use]
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
        }
    }

    /// Posts one payload and maps non-success statuses to a
    /// notification error.
    async fn post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<(), ExchangeError> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| ExchangeError::Notification(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(ExchangeError::Notification(format!(
            "{endpoint} returned {status}: {detail}"
        )))
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), ExchangeError> {
        self.post(
            REPLY_ENDPOINT,
            &ReplyBody {
                reply_token,
                messages: vec![TextMessage::new(text)],
            },
        )
        .await
    }

    async fn push(&self, owner: &OwnerId, text: &str) -> Result<(), ExchangeError> {
        self.post(
            PUSH_ENDPOINT,
            &PushBody {
                to: owner.as_str(),
                messages: vec![TextMessage::new(text)],
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_payload_matches_the_wire_shape() {
        let body = ReplyBody {
            reply_token: "tok",
            messages: vec![TextMessage::new("hello")],
        };
        let json = serde_json::to_value(&body).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({
                "replyToken": "tok",
                "messages": [{"type": "text", "text": "hello"}],
            }))
        );
    }

    #[test]
    fn push_payload_addresses_the_user_id() {
        let body = PushBody {
            to: "U123",
            messages: vec![TextMessage::new("matched!")],
        };
        let json = serde_json::to_value(&body).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({
                "to": "U123",
                "messages": [{"type": "text", "text": "matched!"}],
            }))
        );
    }
}
