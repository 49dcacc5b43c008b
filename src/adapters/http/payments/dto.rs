//! HTTP DTOs for payment endpoints.

use serde::{Deserialize, Serialize};

use crate::application::ProcessWebhookResult;
use crate::domain::policy::{EntitlementRecord, CONTRACT_VERSION_V1};

/// Acknowledgement returned to Stripe for processed and duplicate events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub message: String,
    pub id: String,
    pub event: String,
}

impl From<ProcessWebhookResult> for WebhookAckResponse {
    fn from(result: ProcessWebhookResult) -> Self {
        Self {
            message: "Webhook received".to_string(),
            id: result.event_id,
            event: result.event_type,
        }
    }
}

/// Entitlement records in the shape the policy evaluator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementsResponse {
    pub contract_version: String,
    pub entitlements: Vec<EntitlementRecord>,
}

impl EntitlementsResponse {
    pub fn v1(entitlements: Vec<EntitlementRecord>) -> Self {
        Self {
            contract_version: CONTRACT_VERSION_V1.to_string(),
            entitlements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ProcessOutcome;
    use crate::domain::payments::WebhookStatus;

    #[test]
    fn ack_carries_event_id_and_type() {
        let ack = WebhookAckResponse::from(ProcessWebhookResult {
            event_id: "evt_1".to_string(),
            event_type: "invoice.payment_failed".to_string(),
            outcome: ProcessOutcome::Duplicate(WebhookStatus::Processed),
        });

        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "Webhook received",
                "id": "evt_1",
                "event": "invoice.payment_failed"
            })
        );
    }

    #[test]
    fn entitlements_response_is_versioned() {
        let json = serde_json::to_value(EntitlementsResponse::v1(vec![])).unwrap();

        assert_eq!(json["contract_version"], "v1");
        assert_eq!(json["entitlements"], serde_json::json!([]));
    }
}
