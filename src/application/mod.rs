//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Webhook deliveries and replays are commands; entitlement listing is a query.

pub mod handlers;

pub use handlers::{
    GetUserEntitlementsHandler, GetUserEntitlementsQuery, Mutation, ProcessOutcome,
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    ReplayFailedWebhooksCommand, ReplayFailedWebhooksHandler, ReplaySummary, WebhookProcessor,
};
