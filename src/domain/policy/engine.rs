//! Entitlement policy engine.
//!
//! Pure decision function: no I/O, no interior mutability, safe to share
//! across tasks behind an `Arc`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::contract::{EvaluationRequest, EvaluationResponse, CONTRACT_VERSION_V1};
use super::decision::{DecisionReason, DrmLevel, PolicyDecision};
use super::entitlement::{EntitlementRecord, EntitlementType};
use super::errors::PolicyError;
use crate::config::PolicyConfig;

/// Content categories that need no entitlement.
const FREE_CATEGORIES: &[&str] = &["free", "avod"];

/// Deployment-specific inputs to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySettings {
    /// Upper-cased ISO country codes.
    pub geo_blocked_countries: HashSet<String>,
    pub license_url: String,
}

impl PolicySettings {
    pub fn new<I, S>(geo_blocked_countries: I, license_url: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            geo_blocked_countries: geo_blocked_countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            license_url: license_url.into(),
        }
    }

    pub fn is_geo_blocked(&self, country_code: &str) -> bool {
        let country = country_code.trim().to_uppercase();
        !country.is_empty() && self.geo_blocked_countries.contains(&country)
    }
}

impl From<&PolicyConfig> for PolicySettings {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            geo_blocked_countries: config.geo_blocked_set(),
            license_url: config.drm_license_url.clone(),
        }
    }
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

/// What the entitlement records establish for one content item.
#[derive(Debug, Default, PartialEq, Eq)]
struct EntitlementScan {
    plan_id: Option<String>,
    has_subscription: bool,
    has_purchase: bool,
    purchase_expires_at: Option<DateTime<Utc>>,
}

impl EntitlementScan {
    fn run(records: &[EntitlementRecord], content_id: &str) -> Self {
        let mut scan = EntitlementScan::default();
        for record in records {
            let status = record.normalized_status();
            match record.entitlement_type {
                EntitlementType::Subscription => {
                    if status == "active" || status == "trialing" {
                        scan.has_subscription = true;
                        if scan.plan_id.is_none() && !record.plan_id.is_empty() {
                            scan.plan_id = Some(record.plan_id.clone());
                        }
                    }
                }
                EntitlementType::Purchase => {
                    if record.content_id.as_deref() != Some(content_id) {
                        continue;
                    }
                    if !status.is_empty() && status != "completed" {
                        continue;
                    }
                    scan.has_purchase = true;
                    if record.expires_at.is_some() {
                        scan.purchase_expires_at = record.expires_at;
                    }
                }
                EntitlementType::Unknown => {}
            }
        }
        scan
    }
}

/// Versioned entitlement policy engine.
#[derive(Debug, Clone, Default)]
pub struct EntitlementPolicyEngine {
    settings: PolicySettings,
}

impl EntitlementPolicyEngine {
    pub fn new(settings: PolicySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    /// Evaluates access for one request.
    ///
    /// Precedence is purchase, then subscription, then free category, then
    /// denial. The geo-block check runs last and overrides all of them.
    ///
    /// # Errors
    ///
    /// - `UnsupportedContract` - contract version other than v1
    /// - `InvalidRequest` - blank `content_id` or `user_id`
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse, PolicyError> {
        let version = request.effective_contract_version();
        if version != CONTRACT_VERSION_V1 {
            return Err(PolicyError::UnsupportedContract(version.to_string()));
        }
        let content_id = request.content_id.trim();
        if content_id.is_empty() {
            return Err(PolicyError::InvalidRequest("content_id is required".to_string()));
        }
        if request.user_id.trim().is_empty() {
            return Err(PolicyError::InvalidRequest("user_id is required".to_string()));
        }

        let scan = EntitlementScan::run(&request.entitlements, content_id);
        let drm_level = DrmLevel::for_plan(scan.plan_id.as_deref().unwrap_or_default());

        let mut decision = if scan.has_purchase {
            let mut decision = PolicyDecision::granted(DecisionReason::Purchased, drm_level);
            decision.expires_at = scan.purchase_expires_at;
            decision
        } else if scan.has_subscription {
            PolicyDecision::granted(DecisionReason::Subscription, drm_level)
        } else if is_free_category(&request.content_category) {
            PolicyDecision::granted(DecisionReason::Free, drm_level)
        } else {
            PolicyDecision::denied(DecisionReason::SubscriptionRequired, drm_level)
        };

        if request.is_drm_protected {
            decision.license_url = Some(self.settings.license_url.clone());
        }

        if self.settings.is_geo_blocked(&request.country_code) {
            decision.has_access = false;
            decision.reason = DecisionReason::GeoBlocked;
            decision.expires_at = None;
        }

        Ok(EvaluationResponse {
            contract_version: CONTRACT_VERSION_V1.to_string(),
            decision,
        })
    }
}

fn is_free_category(category: &str) -> bool {
    FREE_CATEGORIES.contains(&category.trim().to_lowercase().as_str())
}
