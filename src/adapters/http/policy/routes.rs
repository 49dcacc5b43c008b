//! Axum router configuration for policy endpoints.

use axum::{routing::post, Router};

use super::handlers::{evaluate_entitlement, PolicyAppState};

/// Create the policy router.
///
/// # Routes
/// - `POST /policy/v1/entitlements/evaluate` - Entitlement decision (bearer required)
pub fn policy_router() -> Router<PolicyAppState> {
    Router::new().route("/policy/v1/entitlements/evaluate", post(evaluate_entitlement))
}
