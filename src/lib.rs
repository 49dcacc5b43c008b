//! StreamVerse Payments - Stripe webhook ingestion and entitlement decisions
//!
//! This crate turns signed, possibly duplicated Stripe events into
//! subscription and purchase records exactly once, re-drives failed events
//! from a residency-gated background worker, and evaluates content access
//! from a user's entitlement records.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
