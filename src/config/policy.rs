//! Entitlement policy configuration

use serde::Deserialize;
use std::collections::HashSet;

use super::error::ValidationError;

/// Policy engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Countries where access is always denied (comma-separated ISO codes)
    #[serde(default)]
    pub geo_blocked_countries: Option<String>,

    /// License server attached to DRM-protected decisions
    #[serde(default = "default_license_url")]
    pub drm_license_url: String,
}

impl PolicyConfig {
    /// Upper-cased set of blocked country codes
    pub fn geo_blocked_set(&self) -> HashSet<String> {
        self.geo_blocked_countries
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Validate policy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.drm_license_url.trim();
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("DRM_LICENSE_URL"));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            geo_blocked_countries: None,
            drm_license_url: default_license_url(),
        }
    }
}

fn default_license_url() -> String {
    "https://drm.streamverse.io/license".to_string()
}
