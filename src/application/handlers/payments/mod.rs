//! Payment handlers.
//!
//! - `ProcessWebhookHandler` - verify, deduplicate and apply one delivery
//! - `ReplayFailedWebhooksHandler` - re-drive failed ledger entries
//! - `GetUserEntitlementsHandler` - entitlement records for the policy engine

mod get_user_entitlements;
mod process_webhook;
mod replay_failed_webhooks;
mod webhook_processor;

pub use get_user_entitlements::{GetUserEntitlementsHandler, GetUserEntitlementsQuery};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use replay_failed_webhooks::{
    ReplayFailedWebhooksCommand, ReplayFailedWebhooksHandler, ReplaySummary,
};
pub use webhook_processor::{Mutation, ProcessOutcome, WebhookProcessor, DEFAULT_MAX_ERROR_LEN};
