//! Entitlement policy domain.
//!
//! Turns entitlement records plus request context into a versioned access
//! decision.

mod contract;
mod decision;
mod engine;
mod entitlement;
mod errors;

pub use contract::{EvaluationRequest, EvaluationResponse, CONTRACT_VERSION_V1};
pub use decision::{DecisionReason, DrmLevel, PolicyDecision};
pub use engine::{EntitlementPolicyEngine, PolicySettings};
pub use entitlement::{EntitlementRecord, EntitlementType};
pub use errors::PolicyError;
