//! Foundation module - Shared domain primitives.
//!
//! Identifiers, request context and error types used across the
//! payments and policy domains.

mod auth;
mod errors;
mod ids;
pub(crate) mod lenient;

pub use auth::{AuthError, RequestContext, ADMIN_ROLE};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::UserId;
