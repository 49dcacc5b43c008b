//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidFormat,

    // Ledger errors
    EventNotFound,
    PayloadMismatch,

    // Authorization errors
    Unauthorized,
    Forbidden,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::EventNotFound => "EVENT_NOT_FOUND",
            ErrorCode::PayloadMismatch => "PAYLOAD_MISMATCH",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a database error from any displayable cause.
    pub fn database(cause: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, cause.to_string())
    }

    /// Ledger entry for `event_id` does not exist.
    pub fn event_not_found(event_id: &str) -> Self {
        Self::new(
            ErrorCode::EventNotFound,
            format!("webhook event not found: {}", event_id),
        )
        .with_detail("event_id", event_id)
    }

    /// Same event id delivered with a different body.
    pub fn payload_mismatch(event_id: &str) -> Self {
        Self::new(
            ErrorCode::PayloadMismatch,
            format!("payload mismatch for existing webhook event: {}", event_id),
        )
        .with_detail("event_id", event_id)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns a detail value if present.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("user_id");
        assert_eq!(format!("{}", err), "Field 'user_id' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("status", "unknown value 'pending'");
        assert_eq!(
            format!("{}", err),
            "Field 'status' has invalid format: unknown value 'pending'"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::event_not_found("evt_1");
        assert_eq!(
            format!("{}", err),
            "[EVENT_NOT_FOUND] webhook event not found: evt_1"
        );
        assert_eq!(err.detail("event_id"), Some("evt_1"));
    }

    #[test]
    fn payload_mismatch_carries_event_id() {
        let err = DomainError::payload_mismatch("evt_2");
        assert_eq!(err.code, ErrorCode::PayloadMismatch);
        assert_eq!(err.detail("event_id"), Some("evt_2"));
    }

    #[test]
    fn database_error_wraps_cause() {
        let err = DomainError::database("connection reset");
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "connection reset");
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::PayloadMismatch), "PAYLOAD_MISMATCH");
        assert_eq!(format!("{}", ErrorCode::InternalError), "INTERNAL_ERROR");
    }
}
