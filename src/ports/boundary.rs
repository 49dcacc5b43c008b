//! Boundary ports used by content-access callers.
//!
//! Implementations fail closed: a timeout, a non-200 answer or an
//! unexpected contract is an error, never an empty or permissive result.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{RequestContext, UserId};
use crate::domain::policy::{EntitlementRecord, EvaluationRequest, PolicyDecision};

/// Errors from outbound payment/policy calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundaryError {
    /// Request could not be built from the given input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No bearer credential to forward.
    #[error("Authorization header is required")]
    MissingAuthorization,

    /// Timeout, connection failure or non-200 status.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream answered with a contract version we do not speak.
    #[error("unsupported contract version: {0}")]
    UnsupportedContract(String),

    /// Upstream body did not match the expected shape.
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

impl BoundaryError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BoundaryError::UpstreamUnavailable(_))
    }
}

/// Fetches a user's entitlement records from the payment service.
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    async fn fetch_entitlements(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
    ) -> Result<Vec<EntitlementRecord>, BoundaryError>;
}

/// Requests an access decision from the policy service.
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    async fn evaluate(
        &self,
        ctx: &RequestContext,
        request: &EvaluationRequest,
    ) -> Result<PolicyDecision, BoundaryError>;
}
