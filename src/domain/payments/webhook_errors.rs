//! Webhook error types for Stripe webhook handling.
//!
//! Every failure the ingestion pipeline can hit, with HTTP status code
//! mapping (which drives Stripe's redelivery) and retryability.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook ingestion and processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// No signing secret configured; unverifiable events are refused.
    #[error("Stripe webhook is not configured")]
    NotConfigured,

    /// Signature header malformed or no v1 signature matched.
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// Signature timestamp outside the tolerance window.
    #[error("Signature timestamp outside tolerance")]
    SignatureStale,

    /// Event envelope could not be parsed or lacks id/type.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event id already recorded with a different body.
    #[error("Payload mismatch for event {0}")]
    PayloadMismatch(String),

    /// Ledger has no entry for the event id.
    #[error("Webhook event not found: {0}")]
    EventNotFound(String),

    /// Neither metadata nor a Stripe link identified the user.
    #[error(
        "Unable to resolve user for stripe event {event_type} (customer={customer_id} subscription={subscription_id})"
    )]
    UserUnresolved {
        event_type: String,
        customer_id: String,
        subscription_id: String,
    },

    /// `data.object` does not have the shape its event type requires.
    #[error("Malformed event object: {0}")]
    MalformedObject(String),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if a later delivery of the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_)
                | WebhookError::UserUnresolved { .. } // link may be created by a later event
                | WebhookError::EventNotFound(_)
        )
    }

    /// Returns true for failures detected before the ledger is touched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WebhookError::NotConfigured
                | WebhookError::SignatureInvalid(_)
                | WebhookError::SignatureStale
                | WebhookError::ParseError(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 4xx: Stripe does not retry (bad signature, bad body, replay with new body)
    /// - 5xx: Stripe redelivers later
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,

            WebhookError::SignatureInvalid(_)
            | WebhookError::SignatureStale
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            WebhookError::PayloadMismatch(_) => StatusCode::CONFLICT,

            WebhookError::EventNotFound(_)
            | WebhookError::UserUnresolved { .. }
            | WebhookError::MalformedObject(_)
            | WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::NotConfigured => "NOT_CONFIGURED",
            WebhookError::SignatureInvalid(_) => "SIGNATURE_INVALID",
            WebhookError::SignatureStale => "SIGNATURE_STALE",
            WebhookError::ParseError(_) => "INVALID_PAYLOAD",
            WebhookError::PayloadMismatch(_) => "PAYLOAD_MISMATCH",
            WebhookError::EventNotFound(_) => "EVENT_NOT_FOUND",
            WebhookError::UserUnresolved { .. } => "USER_UNRESOLVED",
            WebhookError::MalformedObject(_) => "MALFORMED_OBJECT",
            WebhookError::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Repository failures keep their ledger meaning; everything else is storage.
impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        let event_id = err.detail("event_id").unwrap_or_default().to_string();
        match err.code {
            ErrorCode::EventNotFound => WebhookError::EventNotFound(event_id),
            ErrorCode::PayloadMismatch => WebhookError::PayloadMismatch(event_id),
            _ => WebhookError::Database(err.to_string()),
        }
    }
}
