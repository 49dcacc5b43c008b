//! In-memory adapters for tests and database-less local runs.

mod payment_store;
mod webhook_event_store;

pub use payment_store::InMemoryPaymentStore;
pub use webhook_event_store::InMemoryWebhookEventStore;
