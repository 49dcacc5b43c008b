//! Request context for authorization decisions.
//!
//! Authentication happens upstream (the API gateway validates the token and
//! forwards the caller identity). Handlers receive an explicit
//! [`RequestContext`] instead of looking values up by key.

use super::{DomainError, ErrorCode, UserId};
use thiserror::Error;

/// Role that may read any user's payment data.
pub const ADMIN_ROLE: &str = "admin";

/// Caller identity and credentials for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Forwarded caller id, when the gateway supplied one.
    pub user_id: Option<UserId>,

    /// Lowercased caller roles.
    pub roles: Vec<String>,

    /// Raw `Authorization` header value, forwarded to boundary services.
    pub authorization: Option<String>,
}

impl RequestContext {
    /// Creates a context with a bearer credential and no identity.
    pub fn with_authorization(authorization: impl Into<String>) -> Self {
        Self {
            authorization: Some(authorization.into()),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.roles = roles
            .into_iter()
            .map(|r| r.as_ref().trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    /// Returns true if the caller carries a bearer credential.
    pub fn has_bearer(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Token part of a `Bearer <token>` authorization value.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.authorization.as_deref()?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token)
        } else {
            None
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Checks that the caller may read data belonging to `owner`.
    ///
    /// Admins may read anyone's data; everyone else only their own.
    pub fn authorize_owner(&self, owner: &UserId) -> Result<(), AuthError> {
        if !self.has_bearer() {
            return Err(AuthError::MissingCredentials);
        }
        if self.is_admin() {
            return Ok(());
        }
        match &self.user_id {
            Some(caller) if caller == owner => Ok(()),
            _ => Err(AuthError::InsufficientPermissions),
        }
    }
}

/// Authorization failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No usable bearer credential on the request.
    #[error("Authorization header is required")]
    MissingCredentials,

    /// Caller is authenticated but not allowed to perform this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        let code = match err {
            AuthError::MissingCredentials => ErrorCode::Unauthorized,
            AuthError::InsufficientPermissions => ErrorCode::Forbidden,
        };
        DomainError::new(code, err.to_string())
    }
}
