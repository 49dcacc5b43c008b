//! One-off content purchases (rentals, buys, pay-per-view).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::foundation::UserId;

/// Status of a paid purchase.
pub const PURCHASE_COMPLETED: &str = "completed";

/// How long a rental stays watchable.
pub const RENTAL_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    Rent,
    Buy,
    Ppv,
}

impl PurchaseType {
    /// Parses checkout metadata; unknown or missing values mean a buy.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("rent") | Some("rental") => PurchaseType::Rent,
            Some("ppv") => PurchaseType::Ppv,
            _ => PurchaseType::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseType::Rent => "rent",
            PurchaseType::Buy => "buy",
            PurchaseType::Ppv => "ppv",
        }
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase of a single content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    /// Checkout session id; makes the upsert idempotent by value.
    pub id: String,
    pub user_id: UserId,
    pub content_id: String,
    pub purchase_type: PurchaseType,
    /// Amount in minor currency units, when Stripe reported it.
    pub amount: Option<i64>,
    pub currency: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// A completed purchase; rentals expire [`RENTAL_WINDOW_HOURS`] after `now`.
    pub fn completed(
        id: impl Into<String>,
        user_id: UserId,
        content_id: impl Into<String>,
        purchase_type: PurchaseType,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = match purchase_type {
            PurchaseType::Rent => Some(now + Duration::hours(RENTAL_WINDOW_HOURS)),
            PurchaseType::Buy | PurchaseType::Ppv => None,
        };
        Self {
            id: id.into(),
            user_id,
            content_id: content_id.into(),
            purchase_type,
            amount: None,
            currency: "usd".to_string(),
            status: PURCHASE_COMPLETED.to_string(),
            expires_at,
            created_at: now,
        }
    }

    pub fn with_amount(mut self, amount: Option<i64>, currency: &str) -> Self {
        self.amount = amount;
        if !currency.is_empty() {
            self.currency = currency.to_lowercase();
        }
        self
    }

    /// Completed and not yet expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == PURCHASE_COMPLETED && self.expires_at.map_or(true, |exp| exp > now)
    }
}
