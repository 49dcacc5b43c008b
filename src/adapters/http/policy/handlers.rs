//! HTTP handlers for policy evaluation.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::domain::foundation::RequestContext;
use crate::domain::policy::{EntitlementPolicyEngine, EvaluationRequest, EvaluationResponse};

use super::super::error::ApiError;

/// Shared state for policy routes.
#[derive(Clone)]
pub struct PolicyAppState {
    pub engine: Arc<EntitlementPolicyEngine>,
}

/// POST /policy/v1/entitlements/evaluate - Decide access for one content item
pub async fn evaluate_entitlement(
    State(state): State<PolicyAppState>,
    ctx: RequestContext,
    body: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationResponse>, ApiError> {
    if !ctx.has_bearer() {
        return Err(ApiError::unauthorized());
    }
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "policy request body rejected");
        ApiError::bad_request("invalid request body")
    })?;

    let response = state.engine.evaluate(&request)?;

    tracing::info!(
        content_id = %request.content_id,
        user_id = %request.user_id,
        has_access = response.decision.has_access,
        reason = response.decision.reason.as_str(),
        "entitlement evaluated"
    );

    Ok(Json(response))
}
