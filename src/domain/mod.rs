//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, request context, errors)
//! - `payments` - Webhook verification, idempotency ledger, subscription and purchase records
//! - `policy` - Versioned entitlement policy engine

pub mod foundation;
pub mod payments;
pub mod policy;
