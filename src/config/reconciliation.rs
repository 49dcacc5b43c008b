//! Failed-webhook reconciliation and data-residency configuration

use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use super::error::ValidationError;

/// Where regulated payment data may be processed
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResidencyMode {
    /// No regional restriction
    #[default]
    Global,
    /// Only regions in the allow-list may process payment data
    Strict,
}

/// Reconciliation worker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Start the worker at all
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between reconciliation ticks
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Failed events re-driven per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Deployment region of this process
    #[serde(default = "default_region")]
    pub region: String,

    /// Residency enforcement mode
    #[serde(default)]
    pub residency_mode: ResidencyMode,

    /// Regions allowed under strict residency (comma-separated)
    #[serde(default)]
    pub allowed_regions: Option<String>,
}

impl ReconciliationConfig {
    /// Tick interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Normalized region name
    pub fn region(&self) -> String {
        let region = self.region.trim().to_lowercase();
        if region.is_empty() {
            default_region()
        } else {
            region
        }
    }

    /// Normalized allow-list
    pub fn allowed_regions_set(&self) -> HashSet<String> {
        self.allowed_regions
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// Whether this region may process payment data.
    ///
    /// Strict mode fails closed: an empty allow-list admits no region.
    pub fn residency_allows_region(&self) -> bool {
        match self.residency_mode {
            ResidencyMode::Global => true,
            ResidencyMode::Strict => self.allowed_regions_set().contains(&self.region()),
        }
    }

    /// Validate reconciliation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidReconciliationInterval);
        }
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        Ok(())
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval(),
            batch_size: default_batch_size(),
            region: default_region(),
            residency_mode: ResidencyMode::Global,
            allowed_regions: None,
        }
    }
}

fn default_interval() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    50
}

fn default_region() -> String {
    "global".to_string()
}
