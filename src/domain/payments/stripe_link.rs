//! Mapping between Stripe identifiers and internal users.
//!
//! Created by the first event that names both the user and a Stripe id;
//! later events carrying only a customer or subscription id resolve their
//! user through it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::foundation::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StripeLink {
    pub user_id: UserId,
    pub customer_id: String,
    pub subscription_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StripeLink {
    pub fn new(
        user_id: UserId,
        customer_id: impl Into<String>,
        subscription_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            customer_id: customer_id.into(),
            subscription_id: subscription_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether there is anything worth storing.
    pub fn has_identifiers(&self) -> bool {
        !self.customer_id.is_empty() || !self.subscription_id.is_empty()
    }

    /// Applies newer identifiers; empty values never erase stored ones.
    pub fn merge(&mut self, incoming: &StripeLink) {
        if !incoming.customer_id.is_empty() {
            self.customer_id = incoming.customer_id.clone();
        }
        if !incoming.subscription_id.is_empty() {
            self.subscription_id = incoming.subscription_id.clone();
        }
        self.updated_at = incoming.updated_at;
    }
}
