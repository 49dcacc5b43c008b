//! Entitlement records: normalized facts about a user's rights.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::lenient;

/// Kind of entitlement record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementType {
    Subscription,
    Purchase,
    /// Any other type string; ignored by the engine.
    #[default]
    Unknown,
}

impl EntitlementType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "subscription" => EntitlementType::Subscription,
            "purchase" => EntitlementType::Purchase,
            _ => EntitlementType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementType::Subscription => "subscription",
            EntitlementType::Purchase => "purchase",
            EntitlementType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntitlementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntitlementType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(EntitlementType::parse(&lenient::string(deserializer)?))
    }
}

/// A subscription or purchase, as exchanged between the payment and
/// policy services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    #[serde(rename = "type", default)]
    pub entitlement_type: EntitlementType,

    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "String::is_empty"
    )]
    pub plan_id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,

    /// Purchases only.
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    /// Subscription entitlement valid until `expires_at`.
    pub fn subscription(
        plan_id: impl Into<String>,
        status: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            entitlement_type: EntitlementType::Subscription,
            plan_id: plan_id.into(),
            status: status.into(),
            content_id: None,
            expires_at,
        }
    }

    /// Purchase entitlement for one content item.
    pub fn purchase(
        content_id: impl Into<String>,
        status: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            entitlement_type: EntitlementType::Purchase,
            plan_id: String::new(),
            status: status.into(),
            content_id: Some(content_id.into()),
            expires_at,
        }
    }

    /// Lowercased status for comparisons.
    pub fn normalized_status(&self) -> String {
        self.status.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_is_case_insensitive() {
        let record: EntitlementRecord =
            serde_json::from_value(json!({"type": "Subscription", "plan_id": "tier3"})).unwrap();
        assert_eq!(record.entitlement_type, EntitlementType::Subscription);
    }

    #[test]
    fn unknown_or_missing_type_is_unknown() {
        let record: EntitlementRecord = serde_json::from_value(json!({"type": "coupon"})).unwrap();
        assert_eq!(record.entitlement_type, EntitlementType::Unknown);
        let record: EntitlementRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(record.entitlement_type, EntitlementType::Unknown);
    }

    #[test]
    fn expires_at_accepts_date_wrapper_and_ignores_invalid() {
        let wrapped: EntitlementRecord = serde_json::from_value(json!({
            "type": "purchase",
            "content_id": "m1",
            "expires_at": {"$date": "2026-03-01T00:00:00Z"}
        }))
        .unwrap();
        assert!(wrapped.expires_at.is_some());

        let invalid: EntitlementRecord = serde_json::from_value(json!({
            "type": "purchase",
            "expires_at": "next week"
        }))
        .unwrap();
        assert!(invalid.expires_at.is_none());
    }

    #[test]
    fn serializes_in_wire_shape() {
        let record = EntitlementRecord::purchase("m1", "completed", None);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"type": "purchase", "status": "completed", "content_id": "m1"})
        );
    }
}
