//! Outbound boundary clients.
//!
//! - `PaymentEntitlementsClient` - `GET /payments/entitlements/{user_id}`
//! - `PolicyClient` - `POST /policy/v1/entitlements/evaluate`
//!
//! Both forward the caller's bearer header, use a bounded timeout and fail
//! closed on any transport error, non-200 status or contract mismatch.

mod payment_entitlements;
mod policy;

pub use payment_entitlements::PaymentEntitlementsClient;
pub use policy::PolicyClient;

use std::time::Duration;

use reqwest::Url;

use crate::domain::foundation::RequestContext;
use crate::ports::BoundaryError;

fn http_client(timeout: Duration) -> Result<reqwest::Client, BoundaryError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BoundaryError::InvalidRequest(format!("failed to build http client: {}", e)))
}

/// Joins path segments onto `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, BoundaryError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BoundaryError::InvalidRequest(format!("unusable base url: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_base_url(raw: &str) -> Result<Url, BoundaryError> {
    Url::parse(raw.trim().trim_end_matches('/'))
        .map_err(|e| BoundaryError::InvalidRequest(format!("invalid base url {}: {}", raw, e)))
}

/// The raw `Authorization` header to forward; only bearer credentials count.
fn forwarded_authorization(ctx: &RequestContext) -> Result<&str, BoundaryError> {
    match (&ctx.authorization, ctx.has_bearer()) {
        (Some(header), true) => Ok(header.as_str()),
        _ => Err(BoundaryError::MissingAuthorization),
    }
}

fn transport_error(service: &str, err: reqwest::Error) -> BoundaryError {
    if err.is_timeout() {
        BoundaryError::UpstreamUnavailable(format!("{} timed out", service))
    } else {
        BoundaryError::UpstreamUnavailable(format!("{} request failed: {}", service, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_escapes_segments() {
        let base = parse_base_url("http://payments.local/").unwrap();

        let url = endpoint(&base, &["payments", "entitlements", "user/1 2"]).unwrap();

        assert_eq!(
            url.as_str(),
            "http://payments.local/payments/entitlements/user%2F1%202"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = parse_base_url("http://gateway.local/api").unwrap();

        let url = endpoint(&base, &["policy", "v1"]).unwrap();

        assert_eq!(url.as_str(), "http://gateway.local/api/policy/v1");
    }

    #[test]
    fn non_bearer_authorization_is_not_forwarded() {
        let ctx = RequestContext::with_authorization("Basic abc");
        assert_eq!(
            forwarded_authorization(&ctx),
            Err(BoundaryError::MissingAuthorization)
        );

        let ctx = RequestContext::with_authorization("Bearer abc");
        assert_eq!(forwarded_authorization(&ctx), Ok("Bearer abc"));
    }
}
