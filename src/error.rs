//! Service error types with HTTP status code mapping.
//!
//! [`ExchangeError`] is the central error type for the service. Conversational
//! errors (validation, duplicate order numbers, unknown lookups) are rendered
//! back to the requester as reply text and never abort the webhook request;
//! boundary and persistence errors map to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "message": "invalid webhook signature",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                  |
/// |-----------|---------------------|------------------------------|
/// | 1000–1999 | Validation/Boundary | 400 Bad Request              |
/// | 2000–2999 | State/Not Found     | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server              | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// A submitted field failed validation.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Display name of the offending field.
        field: String,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// The order number is already registered by the same owner.
    #[error("order number {0} is already registered")]
    DuplicateOrderNo(String),

    /// No request matches the owner + order number + verification code
    /// triple. Deliberately reveals nothing about which part failed.
    #[error("no request found for that order number and verification code")]
    NotFound,

    /// Cancel attempted on a request that has already been matched.
    #[error("request is already matched and can no longer be cancelled")]
    AlreadyMatched,

    /// The conditional pairing update lost a concurrent race; the rows
    /// were no longer both pending at commit time.
    #[error("pairing update lost a concurrent race")]
    MatchConflict,

    /// Push/reply delivery failure. Logged only; never surfaced to the
    /// affected requester and never reverses a committed match.
    #[error("notification delivery failed: {0}")]
    Notification(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Webhook signature verification failed.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Webhook payload could not be parsed.
    #[error("malformed webhook payload: {0}")]
    InvalidPayload(String),
}

impl ExchangeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation { .. } => 1001,
            Self::InvalidPayload(_) => 1002,
            Self::InvalidSignature => 1003,
            Self::NotFound => 2001,
            Self::AlreadyMatched => 2002,
            Self::DuplicateOrderNo(_) => 2003,
            Self::MatchConflict => 2004,
            Self::Persistence(_) => 3001,
            Self::Notification(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidPayload(_) | Self::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyMatched | Self::DuplicateOrderNo(_) | Self::MatchConflict => {
                StatusCode::CONFLICT
            }
            Self::Persistence(_) | Self::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExchangeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
