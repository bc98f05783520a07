//! Error types for the webhook listener.
//!
//! Each variant maps to exactly one HTTP status, and the response bodies are
//! fixed strings: validation failures are described to the sender, while
//! handler failures collapse to a generic server error so no internal detail
//! leaks into a webhook response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use provisioning::BootstrapError;

/// Errors that can occur while receiving one webhook delivery.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The signature header is missing.
    #[error("missing signature header")]
    MissingSignature,

    /// The signature header is not `sha256=<hex>`.
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    /// HMAC verification failed.
    #[error("invalid signature")]
    InvalidSignature,

    /// The event-type header is missing.
    #[error("missing event type header")]
    MissingEventType,

    /// The event-type label matches no known event kind.
    #[error("unrecognized event type: {0}")]
    UnrecognizedEvent(String),

    /// The body does not deserialize into the labelled event's shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The routed handler failed; the platform will redeliver on the
    /// resulting non-2xx response.
    #[error("event handler failed")]
    Handler(#[from] BootstrapError),
}

impl ListenerError {
    /// Returns the HTTP status for this failure.
    ///
    /// - signature problems: 401
    /// - missing/unknown event type, malformed payload: 400
    /// - handler failure: 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            ListenerError::MissingSignature
            | ListenerError::InvalidSignatureFormat
            | ListenerError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ListenerError::MissingEventType
            | ListenerError::UnrecognizedEvent(_)
            | ListenerError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ListenerError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ListenerError {
    fn into_response(self) -> Response {
        // Bodies never carry internal state or secret material.
        let body = match &self {
            ListenerError::MissingSignature => "Missing signature",
            ListenerError::InvalidSignatureFormat | ListenerError::InvalidSignature => {
                "Invalid signature"
            }
            ListenerError::MissingEventType => "Missing event type header",
            ListenerError::UnrecognizedEvent(_) => "Unrecognized event type",
            ListenerError::MalformedPayload(_) => "Malformed payload",
            ListenerError::Handler(_) => "Internal error",
        };
        (self.status_code(), body).into_response()
    }
}
