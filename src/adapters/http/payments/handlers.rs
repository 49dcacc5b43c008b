//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::application::{
    GetUserEntitlementsHandler, GetUserEntitlementsQuery, ProcessWebhookCommand,
    ProcessWebhookHandler,
};
use crate::domain::foundation::{RequestContext, UserId};
use crate::ports::{PurchaseRepository, SubscriptionRepository};

use super::super::error::ApiError;
use super::dto::{EntitlementsResponse, WebhookAckResponse};

/// Stripe signature header name.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for payment routes.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub webhook_handler: Arc<ProcessWebhookHandler>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
}

impl PaymentsAppState {
    pub fn entitlements_handler(&self) -> GetUserEntitlementsHandler {
        GetUserEntitlementsHandler::new(self.subscriptions.clone(), self.purchases.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payments/webhook - Handle Stripe webhook events
///
/// The body is taken as raw bytes: the signature covers the exact payload.
pub async fn handle_stripe_webhook(
    State(state): State<PaymentsAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, ApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = state.webhook_handler.handle(cmd).await?;
    Ok(Json(result.into()))
}

/// GET /payments/entitlements/:user_id - Entitlement records for a user
pub async fn get_user_entitlements(
    State(state): State<PaymentsAppState>,
    Path(user_id): Path<String>,
    ctx: RequestContext,
) -> Result<Json<EntitlementsResponse>, ApiError> {
    if !ctx.has_bearer() {
        return Err(ApiError::unauthorized());
    }
    let user_id = UserId::new(user_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let records = state
        .entitlements_handler()
        .handle(&ctx, GetUserEntitlementsQuery { user_id })
        .await?;

    Ok(Json(EntitlementsResponse::v1(records)))
}
