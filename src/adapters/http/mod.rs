//! HTTP adapters - REST API implementations.
//!
//! Each area has its own adapter; [`app_router`] assembles them behind the
//! shared tracing and timeout middleware.

pub mod context;
pub mod error;
pub mod health;
pub mod payments;
pub mod policy;
pub mod shutdown;

use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use context::{context_from_headers, USER_ID_HEADER, USER_ROLES_HEADER};
pub use error::{ApiError, ErrorResponse};
pub use payments::{payments_router, PaymentsAppState};
pub use policy::{policy_router, PolicyAppState};
pub use shutdown::shutdown_signal;

/// Build the service router.
///
/// Health stays outside the timeout layer so probes always answer.
pub fn app_router(
    payments: PaymentsAppState,
    policy: PolicyAppState,
    request_timeout: Duration,
) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(payments_router().with_state(payments))
        .merge(policy_router().with_state(policy))
        .layer(middleware)
        .merge(health::health_router())
}
