//! HTTP adapter for payment endpoints.
//!
//! - `POST /payments/webhook` - Handle Stripe webhooks
//! - `GET /payments/entitlements/:user_id` - List a user's entitlement records

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{EntitlementsResponse, WebhookAckResponse};
pub use handlers::{PaymentsAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::payments_router;
