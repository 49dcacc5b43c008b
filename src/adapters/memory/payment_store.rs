//! In-memory payment records: Stripe links, subscriptions and purchases.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::payments::{Purchase, StripeLink, Subscription, SubscriptionStatusUpdate};
use crate::ports::{PurchaseRepository, StripeLinkRepository, SubscriptionRepository};

/// Implements all three payment repositories over `HashMap`s.
///
/// Every write that changes business state bumps a counter so tests can
/// assert how many mutations a flow performed.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    links: RwLock<HashMap<String, StripeLink>>,
    subscriptions: RwLock<HashMap<String, Subscription>>,
    purchases: RwLock<HashMap<String, Purchase>>,
    mutations: AtomicUsize,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Number of subscription and purchase writes applied so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub async fn link_for(&self, user_id: &UserId) -> Option<StripeLink> {
        self.links.read().await.get(user_id.as_str()).cloned()
    }

    pub async fn purchases_for(&self, user_id: &UserId) -> Vec<Purchase> {
        let mut purchases: Vec<Purchase> = self
            .purchases
            .read()
            .await
            .values()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| a.id.cmp(&b.id));
        purchases
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StripeLinkRepository for InMemoryPaymentStore {
    async fn upsert_link(&self, link: StripeLink) -> Result<(), DomainError> {
        if !link.has_identifiers() {
            return Ok(());
        }
        let mut links = self.links.write().await;
        match links.entry(link.user_id.as_str().to_string()) {
            Entry::Occupied(mut slot) => slot.get_mut().merge(&link),
            Entry::Vacant(slot) => {
                slot.insert(link);
            }
        }
        Ok(())
    }

    async fn resolve_user(
        &self,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let links = self.links.read().await;
        if !subscription_id.is_empty() {
            if let Some(link) = links.values().find(|l| l.subscription_id == subscription_id) {
                return Ok(Some(link.user_id.clone()));
            }
        }
        if !customer_id.is_empty() {
            if let Some(link) = links.values().find(|l| l.customer_id == customer_id) {
                return Ok(Some(link.user_id.clone()));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryPaymentStore {
    async fn upsert_by_user(&self, mut subscription: Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        if let Some(existing) = subscriptions.get(subscription.user_id.as_str()) {
            subscription.created_at = existing.created_at;
        }
        subscriptions.insert(subscription.user_id.as_str().to_string(), subscription);
        self.record_mutation();
        Ok(())
    }

    async fn update_status_by_user(
        &self,
        user_id: &UserId,
        update: &SubscriptionStatusUpdate,
    ) -> Result<bool, DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        let Some(subscription) = subscriptions.get_mut(user_id.as_str()) else {
            return Ok(false);
        };
        subscription.status = update.status.clone();
        subscription.cancel_at_period_end = update.cancel_at_period_end;
        subscription.updated_at = Utc::now();
        self.record_mutation();
        Ok(true)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.subscriptions.read().await.get(user_id.as_str()).cloned())
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPaymentStore {
    async fn upsert_purchase(&self, purchase: Purchase) -> Result<(), DomainError> {
        self.purchases
            .write()
            .await
            .insert(purchase.id.clone(), purchase);
        self.record_mutation();
        Ok(())
    }

    async fn list_active_by_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Purchase>, DomainError> {
        let mut active: Vec<Purchase> = self
            .purchases
            .read()
            .await
            .values()
            .filter(|p| &p.user_id == user_id && p.is_active(now))
            .cloned()
            .collect();
        active.sort_by_key(|p| p.created_at);
        Ok(active)
    }
}
