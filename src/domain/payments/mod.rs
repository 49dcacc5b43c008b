//! Payments domain: Stripe webhook verification, the idempotency ledger
//! state machine, and the subscription/purchase records webhooks mutate.

mod purchase;
mod status;
mod stripe_event;
mod stripe_link;
mod subscription;
mod webhook_errors;
mod webhook_event;
mod webhook_verifier;

pub use purchase::{Purchase, PurchaseType, PURCHASE_COMPLETED, RENTAL_WINDOW_HOURS};
pub use status::{normalize_subscription_status, STATUS_ACTIVE, STATUS_CANCELED, STATUS_PAUSED};
pub use stripe_event::{
    CheckoutSessionObject, GenericObject, InvoiceObject, Metadata, StripeEvent, StripeEventData,
    StripeEventType, StripeObject, SubscriptionObject, DEFAULT_PLAN_ID,
};
pub use stripe_link::StripeLink;
pub use subscription::{Subscription, SubscriptionStatusUpdate};
pub use webhook_errors::WebhookError;
pub use webhook_event::{
    decide_begin, truncate_error, BeginDecision, BeginOutcome, NewWebhookEvent, WebhookEvent,
    WebhookStatus,
};
pub use webhook_verifier::{
    payload_hash, sign_payload, signature_header, SignatureHeader, StripeWebhookVerifier,
    DEFAULT_TOLERANCE_SECS,
};

#[cfg(test)]
pub(crate) use stripe_event::fixtures;
