//! Error responses shared by all HTTP adapters.
//!
//! Every failure is rendered as `{"code": ..., "message": ...}`. Internal
//! causes are logged, not echoed to callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payments::WebhookError;
use crate::domain::policy::PolicyError;

/// Standard error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Authorization header is required",
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let message = match &err {
            WebhookError::NotConfigured => "Stripe webhook is not configured",
            WebhookError::SignatureInvalid(_) | WebhookError::SignatureStale => {
                "Invalid Stripe signature"
            }
            WebhookError::ParseError(_) => "Invalid webhook payload",
            WebhookError::PayloadMismatch(_) => {
                "Event id was already received with a different payload"
            }
            WebhookError::EventNotFound(_)
            | WebhookError::UserUnresolved { .. }
            | WebhookError::MalformedObject(_)
            | WebhookError::Database(_) => "Failed to process webhook",
        };

        if err.is_rejection() {
            tracing::warn!(error = %err, "stripe webhook rejected");
        } else {
            tracing::error!(error = %err, "stripe webhook failed");
        }

        Self::new(err.status_code(), err.code(), message)
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        Self::new(err.status_code(), err.code(), err.to_string())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match err.code {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorCode::EventNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadMismatch => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
            return Self::new(status, err.code.to_string(), "Internal server error");
        }
        Self::new(status, err.code.to_string(), err.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_errors_map_to_gateway_statuses() {
        let cases = [
            (WebhookError::NotConfigured, StatusCode::SERVICE_UNAVAILABLE),
            (
                WebhookError::SignatureInvalid("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (WebhookError::SignatureStale, StatusCode::BAD_REQUEST),
            (WebhookError::ParseError("x".into()), StatusCode::BAD_REQUEST),
            (WebhookError::PayloadMismatch("evt".into()), StatusCode::CONFLICT),
            (
                WebhookError::Database("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn webhook_failure_hides_internal_cause() {
        let api = ApiError::from(WebhookError::Database("password=hunter2".into()));

        assert_eq!(api.body.message, "Failed to process webhook");
        assert_eq!(api.body.code, "DATABASE_ERROR");
    }

    #[test]
    fn policy_error_keeps_its_message() {
        let api = ApiError::from(PolicyError::UnsupportedContract("v2".into()));

        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.body.message, "unsupported contract version: v2");
    }

    #[test]
    fn domain_authorization_errors_map_to_4xx() {
        let forbidden = DomainError::new(ErrorCode::Forbidden, "Insufficient permissions");
        let unauthorized = DomainError::new(ErrorCode::Unauthorized, "missing");

        assert_eq!(ApiError::from(forbidden).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(unauthorized).status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn database_error_message_is_generic() {
        let api = ApiError::from(DomainError::database("relation does not exist"));

        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.message, "Internal server error");
    }
}
