//! Request context extraction.
//!
//! The upstream auth gateway validates the token and forwards the caller's
//! identity as headers. Handlers decide for themselves whether a missing
//! credential is an error, so extraction never rejects.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::domain::foundation::{RequestContext, UserId};

/// Forwarded caller id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Forwarded comma-separated roles.
pub const USER_ROLES_HEADER: &str = "x-user-roles";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Builds a [`RequestContext`] from forwarded headers.
pub fn context_from_headers(headers: &HeaderMap) -> RequestContext {
    let mut ctx = RequestContext {
        authorization: header_str(headers, header::AUTHORIZATION.as_str()).map(str::to_string),
        ..RequestContext::default()
    };

    if let Some(user_id) = header_str(headers, USER_ID_HEADER).and_then(|v| UserId::new(v).ok()) {
        ctx = ctx.with_user(user_id);
    }
    if let Some(roles) = header_str(headers, USER_ROLES_HEADER) {
        ctx = ctx.with_roles(roles.split(',').map(str::trim).filter(|r| !r.is_empty()));
    }
    ctx
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(context_from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_user_and_roles() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" u1 "));
        headers.insert(USER_ROLES_HEADER, HeaderValue::from_static("viewer, Admin,,"));

        let ctx = context_from_headers(&headers);

        assert_eq!(ctx.bearer_token(), Some("abc"));
        assert_eq!(ctx.user_id, Some(UserId::new("u1").unwrap()));
        assert_eq!(ctx.roles, vec!["viewer".to_string(), "admin".to_string()]);
        assert!(ctx.is_admin());
    }

    #[test]
    fn empty_headers_give_anonymous_context() {
        let ctx = context_from_headers(&HeaderMap::new());

        assert!(ctx.authorization.is_none());
        assert!(ctx.user_id.is_none());
        assert!(ctx.roles.is_empty());
    }

    #[test]
    fn blank_user_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));

        assert!(context_from_headers(&headers).user_id.is_none());
    }
}
