//! Policy evaluation errors.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors from the entitlement policy engine. No decision accompanies them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A required request field is missing.
    #[error("{0}")]
    InvalidRequest(String),

    /// Caller speaks a contract version this engine does not.
    #[error("unsupported contract version: {0}")]
    UnsupportedContract(String),
}

impl PolicyError {
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::InvalidRequest(_) => "INVALID_REQUEST",
            PolicyError::UnsupportedContract(_) => "UNSUPPORTED_CONTRACT",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}
