//! Repository ports for the records webhook events mutate.
//!
//! Every write is idempotent by value: applying the same update twice
//! leaves the same state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payments::{Purchase, StripeLink, Subscription, SubscriptionStatusUpdate};

/// Stripe customer/subscription id to user mapping.
#[async_trait]
pub trait StripeLinkRepository: Send + Sync {
    /// Inserts or merges the link for `link.user_id`.
    ///
    /// Empty incoming ids never erase stored ones. A link without any
    /// Stripe id is not stored.
    async fn upsert_link(&self, link: StripeLink) -> Result<(), DomainError>;

    /// Resolves a user by subscription id, then by customer id.
    async fn resolve_user(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError>;
}

/// One subscription per user.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Replaces the user's subscription, keeping its original `created_at`.
    async fn upsert_by_user(&self, subscription: Subscription) -> Result<(), DomainError>;

    /// Updates status fields of an existing subscription.
    ///
    /// Returns `false` when the user has no subscription (nothing changed).
    async fn update_status_by_user(
        &self,
        user_id: &UserId,
        update: &SubscriptionStatusUpdate,
    ) -> Result<bool, DomainError>;

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;
}

/// Content purchases.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Inserts or replaces the purchase with the same id.
    async fn upsert_purchase(&self, purchase: Purchase) -> Result<(), DomainError>;

    /// Completed purchases that have not expired at `now`.
    async fn list_active_by_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Purchase>, DomainError>;
}
