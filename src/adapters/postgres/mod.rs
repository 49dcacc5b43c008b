//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresWebhookEventStore` - Idempotency ledger for Stripe events
//! - `PostgresPaymentRepository` - Stripe links, subscriptions and purchases

mod payment_repository;
mod webhook_event_store;

pub use payment_repository::PostgresPaymentRepository;
pub use webhook_event_store::PostgresWebhookEventStore;
