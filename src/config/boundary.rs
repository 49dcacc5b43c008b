//! Outbound boundary client configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Base URLs and timeouts for the payment and policy boundaries
#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryConfig {
    /// Payment service base URL (entitlement record fetch)
    #[serde(default = "default_payment_base_url")]
    pub payment_base_url: String,

    /// Policy service base URL (entitlement evaluation)
    #[serde(default = "default_policy_base_url")]
    pub policy_base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl BoundaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate boundary configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_http_url(&self.payment_base_url) {
            return Err(ValidationError::InvalidUrl("PAYMENT_BASE_URL"));
        }
        if !is_http_url(&self.policy_base_url) {
            return Err(ValidationError::InvalidUrl("POLICY_BASE_URL"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 30 {
            return Err(ValidationError::InvalidBoundaryTimeout);
        }
        Ok(())
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            payment_base_url: default_payment_base_url(),
            policy_base_url: default_policy_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn default_payment_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_policy_base_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_timeout() -> u64 {
    5
}
