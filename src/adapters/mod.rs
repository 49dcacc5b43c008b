//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - sqlx-backed ledger and payment records
//! - `memory` - in-process stores for tests and local runs
//! - `http` - axum routers for webhooks, entitlements and policy evaluation
//! - `clients` - reqwest clients for the payment and policy boundaries
//! - `workers` - background reconciliation loop

pub mod clients;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod workers;

pub use clients::{PaymentEntitlementsClient, PolicyClient};
pub use memory::{InMemoryPaymentStore, InMemoryWebhookEventStore};
pub use postgres::{PostgresPaymentRepository, PostgresWebhookEventStore};
pub use workers::{ReconciliationWorker, WorkerError};
