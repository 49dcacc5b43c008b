//! WebhookEventStore port - the webhook idempotency ledger.
//!
//! Stripe delivers events at least once, sometimes concurrently. The
//! ledger decides which caller may apply an event's business mutation:
//! `begin` must be an atomic check-and-set per `event_id` so exactly one
//! concurrent caller observes [`BeginOutcome::Acquired`].

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payments::{BeginOutcome, NewWebhookEvent, WebhookEvent};

/// Durable ledger keyed by Stripe event id.
///
/// Entries are never deleted.
#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Claims an attempt for the event.
    ///
    /// - absent: insert as `processing`, `attempts = 1`, acquired
    /// - `processed` / `processing`: already handled
    /// - `failed`: back to `processing`, attempts incremented, acquired
    ///
    /// # Errors
    ///
    /// `ErrorCode::PayloadMismatch` when both the stored and supplied
    /// hashes are known and differ.
    async fn begin(&self, event: NewWebhookEvent) -> Result<BeginOutcome, DomainError>;

    /// Marks the event `processed` and clears its last error.
    ///
    /// # Errors
    ///
    /// `ErrorCode::EventNotFound` if `begin` was never called for it.
    async fn mark_processed(&self, event_id: &str) -> Result<(), DomainError>;

    /// Marks the event `failed` with `error`.
    ///
    /// # Errors
    ///
    /// `ErrorCode::EventNotFound` if `begin` was never called for it.
    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<(), DomainError>;

    /// Up to `limit` failed events, least recently updated first.
    async fn list_failed(&self, limit: u32) -> Result<Vec<WebhookEvent>, DomainError>;

    /// Looks up one entry.
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError>;
}
