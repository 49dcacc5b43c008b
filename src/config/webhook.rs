//! Inbound webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Stripe webhook ingestion settings
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Stripe webhook signing secret. When absent the webhook endpoint
    /// answers 503 instead of accepting unverifiable events.
    #[serde(default)]
    pub stripe_webhook_secret: Option<SecretString>,

    /// Allowed distance between the signature timestamp and now, in seconds
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: u64,

    /// Longest error message stored on a failed ledger entry
    #[serde(default = "default_max_error_len")]
    pub max_error_len: usize,

    /// Reclaim `processing` entries untouched for this many seconds.
    /// Unset keeps in-flight entries untouchable.
    #[serde(default)]
    pub stale_processing_after_secs: Option<u64>,
}

impl WebhookConfig {
    /// Signature freshness window
    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }

    /// Age after which an in-flight ledger entry may be taken over
    pub fn stale_processing_after(&self) -> Option<Duration> {
        self.stale_processing_after_secs.map(Duration::from_secs)
    }

    /// Whether a signing secret is configured
    pub fn is_configured(&self) -> bool {
        self.stripe_webhook_secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(secret) = &self.stripe_webhook_secret {
            let secret = secret.expose_secret();
            if !secret.is_empty() && !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }
        if self.tolerance_secs == 0 || self.tolerance_secs > 3600 {
            return Err(ValidationError::InvalidSignatureTolerance);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            stripe_webhook_secret: None,
            tolerance_secs: default_tolerance(),
            max_error_len: default_max_error_len(),
            stale_processing_after_secs: None,
        }
    }
}

fn default_tolerance() -> u64 {
    300
}

fn default_max_error_len() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebhookConfig::default();
        assert_eq!(config.tolerance(), Duration::from_secs(300));
        assert_eq!(config.max_error_len, 1000);
        assert!(config.stale_processing_after().is_none());
        assert!(!config.is_configured());
    }

    #[test]
    fn test_empty_secret_is_not_configured() {
        let config = WebhookConfig {
            stripe_webhook_secret: Some(SecretString::new(String::new())),
            ..Default::default()
        };
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_secret_prefix() {
        let config = WebhookConfig {
            stripe_webhook_secret: Some(SecretString::new("secret_xxx".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        ));
    }

    #[test]
    fn test_validation_tolerance_bounds() {
        let config = WebhookConfig {
            tolerance_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = WebhookConfig {
            stripe_webhook_secret: Some(SecretString::new("whsec_do_not_print".to_string())),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert!(!format!("{:?}", config).contains("do_not_print"));
    }
}
