//! Versioned evaluation contract shared by callers and the engine.

use serde::{Deserialize, Serialize};

use super::decision::PolicyDecision;
use super::entitlement::EntitlementRecord;

/// Current stable contract version.
pub const CONTRACT_VERSION_V1: &str = "v1";

/// Input to an entitlement evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Empty means [`CONTRACT_VERSION_V1`].
    #[serde(default)]
    pub contract_version: String,
    #[serde(default)]
    pub content_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub content_category: String,
    #[serde(default)]
    pub is_drm_protected: bool,
    #[serde(default)]
    pub entitlements: Vec<EntitlementRecord>,
}

impl EvaluationRequest {
    /// A v1 request for `content_id`/`user_id` with no context.
    pub fn v1(content_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            contract_version: CONTRACT_VERSION_V1.to_string(),
            content_id: content_id.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.content_category = category.into();
        self
    }

    pub fn with_drm(mut self, is_drm_protected: bool) -> Self {
        self.is_drm_protected = is_drm_protected;
        self
    }

    pub fn with_entitlements(mut self, entitlements: Vec<EntitlementRecord>) -> Self {
        self.entitlements = entitlements;
        self
    }

    /// Contract version with the empty default applied.
    pub fn effective_contract_version(&self) -> &str {
        let version = self.contract_version.trim();
        if version.is_empty() {
            CONTRACT_VERSION_V1
        } else {
            version
        }
    }
}

/// Versioned decision envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub contract_version: String,
    pub decision: PolicyDecision,
}
