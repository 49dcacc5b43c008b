//! Subscription records owned by the payment service.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::status::{normalize_subscription_status, STATUS_ACTIVE};
use super::stripe_event::SubscriptionObject;
use crate::domain::foundation::UserId;

/// A user's subscription; at most one per user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    pub user_id: UserId,
    pub plan_id: String,
    pub status: String,
    pub payment_method_id: String,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Builds the full subscription state carried by a
    /// `customer.subscription.created|updated` object.
    ///
    /// Missing period bounds fall back to `now`.
    pub fn from_stripe(
        user_id: UserId,
        object: &SubscriptionObject,
        customer_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            plan_id: object.plan_id().to_string(),
            status: normalize_subscription_status(&object.status),
            payment_method_id: object.default_payment_method.clone(),
            stripe_customer_id: customer_id.to_string(),
            stripe_subscription_id: object.id.clone(),
            current_period_start: unix_or(object.current_period_start, now),
            current_period_end: unix_or(object.current_period_end, now),
            cancel_at_period_end: object.cancel_at_period_end,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

/// Partial update applied by deletion and invoice events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionStatusUpdate {
    pub status: String,
    pub cancel_at_period_end: bool,
}

impl SubscriptionStatusUpdate {
    pub fn new(status: impl Into<String>, cancel_at_period_end: bool) -> Self {
        Self {
            status: status.into(),
            cancel_at_period_end,
        }
    }
}

fn unix_or(secs: Option<i64>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_stripe_maps_all_fields() {
        let object: SubscriptionObject = serde_json::from_value(json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "past_due",
            "items": {"data": [{"plan": {"id": "tier2"}}]},
            "current_period_start": 1704067200,
            "current_period_end": 1706745600,
            "cancel_at_period_end": true,
            "default_payment_method": "pm_1"
        }))
        .unwrap();
        let now = Utc::now();

        let sub = Subscription::from_stripe(UserId::new("u1").unwrap(), &object, "cus_1", now);

        assert_eq!(sub.plan_id, "tier2");
        assert_eq!(sub.status, "paused");
        assert_eq!(sub.payment_method_id, "pm_1");
        assert_eq!(sub.stripe_subscription_id, "sub_1");
        assert_eq!(sub.current_period_start.timestamp(), 1704067200);
        assert_eq!(sub.current_period_end.timestamp(), 1706745600);
        assert!(sub.cancel_at_period_end);
        assert!(!sub.is_active());
    }

    #[test]
    fn missing_periods_default_to_now() {
        let object = SubscriptionObject::default();
        let now = Utc::now();

        let sub = Subscription::from_stripe(UserId::new("u1").unwrap(), &object, "", now);

        assert_eq!(sub.current_period_start, now);
        assert_eq!(sub.current_period_end, now);
        assert_eq!(sub.plan_id, "premium");
    }
}
