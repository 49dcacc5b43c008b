//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_user_entitlements, handle_stripe_webhook, PaymentsAppState};

/// Create the payments router.
///
/// # Routes
/// - `POST /payments/webhook` - Stripe webhooks (no auth, signature verified)
/// - `GET /payments/entitlements/:user_id` - Entitlement records (bearer, owner or admin)
pub fn payments_router() -> Router<PaymentsAppState> {
    Router::new()
        .route("/payments/webhook", post(handle_stripe_webhook))
        .route("/payments/entitlements/:user_id", get(get_user_entitlements))
}
