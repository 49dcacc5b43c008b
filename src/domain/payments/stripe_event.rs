//! Stripe webhook event types.
//!
//! The envelope is parsed strictly enough to route the event; the
//! `data.object` payload is extracted into a variant keyed by event type,
//! capturing only the fields the processor reads. Fields Stripe may send
//! as an expanded object instead of an id (e.g. `customer`) read as empty.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::webhook_errors::WebhookError;
use crate::domain::foundation::lenient;

/// Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    #[serde(default)]
    pub id: String,

    /// Type of event (e.g., "invoice.payment_succeeded").
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    #[serde(default)]
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (shape depends on event type).
    #[serde(default)]
    pub object: Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<Value>,
}

impl StripeEvent {
    /// Parses a raw webhook body.
    ///
    /// # Errors
    ///
    /// `ParseError` when the body is not JSON or `id`/`type` are blank.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let mut event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        event.id = event.id.trim().to_string();
        event.event_type = event.event_type.trim().to_string();

        if event.id.is_empty() {
            return Err(WebhookError::ParseError("missing event id".to_string()));
        }
        if event.event_type.is_empty() {
            return Err(WebhookError::ParseError("missing event type".to_string()));
        }
        Ok(event)
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::parse(&self.event_type)
    }

    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }
}

/// Stripe event types that produce a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CustomerSubscriptionCreated,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    CheckoutSessionCompleted,
    /// Acknowledged and recorded, no mutation.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from its Stripe name.
    pub fn parse(s: &str) -> Self {
        match s {
            "customer.subscription.created" => Self::CustomerSubscriptionCreated,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerSubscriptionCreated => "customer.subscription.created",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::Unknown => "unknown",
        }
    }
}

/// Typed view of `data.object`, selected by the event type prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum StripeObject {
    Subscription(SubscriptionObject),
    Invoice(InvoiceObject),
    CheckoutSession(CheckoutSessionObject),
    Other(GenericObject),
}

impl StripeObject {
    /// Extracts the object for `event_type`.
    ///
    /// # Errors
    ///
    /// `MalformedObject` when `object` is not a JSON object.
    pub fn from_event(event_type: &str, object: &Value) -> Result<Self, WebhookError> {
        if !object.is_object() {
            return Err(WebhookError::MalformedObject(format!(
                "{} data.object is not an object",
                event_type
            )));
        }

        let parsed = if event_type.starts_with("customer.subscription.") {
            serde_json::from_value(object.clone()).map(StripeObject::Subscription)
        } else if event_type.starts_with("invoice.") {
            serde_json::from_value(object.clone()).map(StripeObject::Invoice)
        } else if event_type.starts_with("checkout.session.") {
            serde_json::from_value(object.clone()).map(StripeObject::CheckoutSession)
        } else {
            serde_json::from_value(object.clone()).map(StripeObject::Other)
        };

        parsed.map_err(|e| WebhookError::MalformedObject(format!("{}: {}", event_type, e)))
    }

    /// Stripe customer id, empty when absent.
    pub fn customer_id(&self) -> &str {
        match self {
            StripeObject::Subscription(o) => &o.customer,
            StripeObject::Invoice(o) => &o.customer,
            StripeObject::CheckoutSession(o) => &o.customer,
            StripeObject::Other(o) => &o.customer,
        }
    }

    /// Stripe subscription id: the object's own id for subscription
    /// events, its `subscription` reference otherwise.
    pub fn subscription_id(&self) -> &str {
        match self {
            StripeObject::Subscription(o) => &o.id,
            StripeObject::Invoice(o) => &o.subscription,
            StripeObject::CheckoutSession(o) => &o.subscription,
            StripeObject::Other(o) => &o.subscription,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            StripeObject::Subscription(o) => &o.metadata,
            StripeObject::Invoice(o) => &o.metadata,
            StripeObject::CheckoutSession(o) => &o.metadata,
            StripeObject::Other(o) => &o.metadata,
        }
    }

    /// `metadata.user_id` when present and non-blank.
    pub fn metadata_user_id(&self) -> Option<&str> {
        self.metadata().get("user_id")
    }
}

/// `customer.subscription.*` object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscriptionObject {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default)]
    pub items: Value,
    #[serde(default, deserialize_with = "lenient::unix_seconds")]
    pub current_period_start: Option<i64>,
    #[serde(default, deserialize_with = "lenient::unix_seconds")]
    pub current_period_end: Option<i64>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub cancel_at_period_end: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub default_payment_method: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Plan used when a subscription carries no item plan or price.
pub const DEFAULT_PLAN_ID: &str = "premium";

impl SubscriptionObject {
    /// `items.data[0].plan.id`, then `items.data[0].price.id`, then
    /// [`DEFAULT_PLAN_ID`].
    pub fn plan_id(&self) -> &str {
        ["/data/0/plan/id", "/data/0/price/id"]
            .iter()
            .filter_map(|path| self.items.pointer(path).and_then(Value::as_str))
            .find(|id| !id.is_empty())
            .unwrap_or(DEFAULT_PLAN_ID)
    }
}

/// `invoice.*` object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvoiceObject {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub subscription: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// `checkout.session.*` object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckoutSessionObject {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub subscription: String,
    #[serde(default, deserialize_with = "lenient::unix_seconds")]
    pub amount_total: Option<i64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub currency: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Any other object type; only the linking fields are read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenericObject {
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub subscription: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Stripe metadata map. Non-string values are kept but read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(HashMap<String, Value>);

impl Metadata {
    /// Trimmed, non-empty string value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Metadata(map.into_iter().collect())),
            _ => Ok(Metadata::default()),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Metadata {
    fn from(entries: [(&str, &str); N]) -> Self {
        Metadata(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for test events.

    use super::*;

    /// Builder for creating test StripeEvent instances.
    pub struct StripeEventBuilder {
        id: String,
        event_type: String,
        object: Value,
    }

    impl Default for StripeEventBuilder {
        fn default() -> Self {
            Self {
                id: "evt_test_123".to_string(),
                event_type: "invoice.payment_succeeded".to_string(),
                object: serde_json::json!({}),
            }
        }
    }

    impl StripeEventBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn id(mut self, id: impl Into<String>) -> Self {
            self.id = id.into();
            self
        }

        pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
            self.event_type = event_type.into();
            self
        }

        pub fn object(mut self, object: Value) -> Self {
            self.object = object;
            self
        }

        pub fn build(self) -> StripeEvent {
            StripeEvent {
                id: self.id,
                event_type: self.event_type,
                created: chrono::Utc::now().timestamp(),
                data: StripeEventData {
                    object: self.object,
                    previous_attributes: None,
                },
                livemode: false,
                api_version: Some("2023-10-16".to_string()),
            }
        }
    }
}
