//! Policy decision output.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Why access was granted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Purchased,
    Subscription,
    Free,
    SubscriptionRequired,
    GeoBlocked,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Purchased => "purchased",
            DecisionReason::Subscription => "subscription",
            DecisionReason::Free => "free",
            DecisionReason::SubscriptionRequired => "subscription_required",
            DecisionReason::GeoBlocked => "geo_blocked",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback security level. `1` is the strictest (hardware-backed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrmLevel {
    L1,
    L2,
    #[default]
    L3,
}

impl DrmLevel {
    /// Tier table keyed by exact plan id; unknown and empty plans get level 3.
    pub fn for_plan(plan_id: &str) -> Self {
        match plan_id {
            "premium" | "tier3" => DrmLevel::L1,
            "standard" | "pro" | "tier2" => DrmLevel::L2,
            _ => DrmLevel::L3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrmLevel::L1 => "1",
            DrmLevel::L2 => "2",
            DrmLevel::L3 => "3",
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim() {
            "1" => DrmLevel::L1,
            "2" => DrmLevel::L2,
            _ => DrmLevel::L3,
        }
    }
}

impl fmt::Display for DrmLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DrmLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DrmLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DrmLevel::parse(&raw))
    }
}

/// Complete access decision for one content/user/context tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub has_access: bool,
    pub reason: DecisionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub drm_level: DrmLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

impl PolicyDecision {
    pub fn granted(reason: DecisionReason, drm_level: DrmLevel) -> Self {
        Self {
            has_access: true,
            reason,
            expires_at: None,
            drm_level,
            license_url: None,
        }
    }

    pub fn denied(reason: DecisionReason, drm_level: DrmLevel) -> Self {
        Self {
            has_access: false,
            reason,
            expires_at: None,
            drm_level,
            license_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drm_tier_table() {
        assert_eq!(DrmLevel::for_plan("tier3"), DrmLevel::L1);
        assert_eq!(DrmLevel::for_plan("premium"), DrmLevel::L1);
        assert_eq!(DrmLevel::for_plan("tier2"), DrmLevel::L2);
        assert_eq!(DrmLevel::for_plan("pro"), DrmLevel::L2);
        assert_eq!(DrmLevel::for_plan("standard"), DrmLevel::L2);
        assert_eq!(DrmLevel::for_plan("basic"), DrmLevel::L3);
        assert_eq!(DrmLevel::for_plan(""), DrmLevel::L3);
    }

    #[test]
    fn drm_tier_table_matches_plan_ids_exactly() {
        assert_eq!(DrmLevel::for_plan("TIER3"), DrmLevel::L3);
        assert_eq!(DrmLevel::for_plan(" premium "), DrmLevel::L3);
        assert_eq!(DrmLevel::for_plan("Standard"), DrmLevel::L3);
    }

    #[test]
    fn decision_serializes_in_wire_shape() {
        let mut decision = PolicyDecision::granted(DecisionReason::Subscription, DrmLevel::L1);
        decision.license_url = Some("https://drm.example/license".to_string());

        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            json!({
                "has_access": true,
                "reason": "subscription",
                "drm_level": "1",
                "license_url": "https://drm.example/license"
            })
        );
    }

    #[test]
    fn decision_deserializes_without_optional_fields() {
        let decision: PolicyDecision =
            serde_json::from_value(json!({"has_access": false, "reason": "geo_blocked"})).unwrap();
        assert_eq!(decision.reason, DecisionReason::GeoBlocked);
        assert_eq!(decision.drm_level, DrmLevel::L3);
        assert!(decision.license_url.is_none());
    }
}
