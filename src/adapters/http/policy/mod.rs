//! HTTP adapter for the entitlement policy engine.

pub mod handlers;
pub mod routes;

pub use handlers::PolicyAppState;
pub use routes::policy_router;
