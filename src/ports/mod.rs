//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `WebhookEventStore` - Stripe webhook idempotency ledger
//! - `StripeLinkRepository`, `SubscriptionRepository`, `PurchaseRepository` -
//!   records mutated by webhook events
//!
//! ## Boundary Ports
//!
//! - `EntitlementProvider` - entitlement record fetch from the payment service
//! - `PolicyProvider` - access decision from the policy service

mod boundary;
mod payment_repository;
mod webhook_event_store;

pub use boundary::{BoundaryError, EntitlementProvider, PolicyProvider};
pub use payment_repository::{PurchaseRepository, StripeLinkRepository, SubscriptionRepository};
pub use webhook_event_store::WebhookEventStore;
