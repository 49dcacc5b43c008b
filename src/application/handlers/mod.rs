//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod payments;

pub use payments::{
    GetUserEntitlementsHandler, GetUserEntitlementsQuery, Mutation, ProcessOutcome,
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    ReplayFailedWebhooksCommand, ReplayFailedWebhooksHandler, ReplaySummary, WebhookProcessor,
};
