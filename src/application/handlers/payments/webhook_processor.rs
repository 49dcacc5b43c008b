//! WebhookProcessor - turns one deduplicated Stripe event into one business mutation.
//!
//! Every delivery path (the inline webhook endpoint and the reconciliation
//! replay) goes through [`WebhookProcessor::process`], which runs the ledger
//! protocol: `begin` decides who owns the attempt, the owner applies the
//! mutation and then marks the entry processed or failed.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::domain::foundation::UserId;
use crate::domain::payments::{
    truncate_error, BeginOutcome, NewWebhookEvent, Purchase, PurchaseType, StripeEventType,
    StripeLink, StripeObject, Subscription, SubscriptionStatusUpdate, WebhookError, WebhookStatus,
    STATUS_ACTIVE, STATUS_CANCELED, STATUS_PAUSED,
};
use crate::ports::{
    PurchaseRepository, StripeLinkRepository, SubscriptionRepository, WebhookEventStore,
};

/// Cap applied to error messages before they are stored on the ledger.
pub const DEFAULT_MAX_ERROR_LEN: usize = 1000;

/// Business effect of one applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Full subscription state written from a subscription object.
    SubscriptionUpserted,
    /// Status update; `matched` is false when the user had no subscription.
    SubscriptionStatus { status: String, matched: bool },
    /// Completed purchase recorded from a checkout session.
    PurchaseRecorded { purchase_id: String },
    /// Checkout without content: only the customer link was stored.
    LinkOnly,
    /// Event type this service does not act on.
    Ignored,
}

/// Result of running an event through the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// This call owned the attempt and applied the mutation.
    Processed { attempts: u32, mutation: Mutation },
    /// Duplicate delivery or another worker holds the event.
    Duplicate(WebhookStatus),
}

impl ProcessOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ProcessOutcome::Duplicate(_))
    }
}

/// Applies Stripe events to links, subscriptions and purchases.
pub struct WebhookProcessor {
    ledger: Arc<dyn WebhookEventStore>,
    links: Arc<dyn StripeLinkRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    max_error_len: usize,
}

impl WebhookProcessor {
    pub fn new(
        ledger: Arc<dyn WebhookEventStore>,
        links: Arc<dyn StripeLinkRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        purchases: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self {
            ledger,
            links,
            subscriptions,
            purchases,
            max_error_len: DEFAULT_MAX_ERROR_LEN,
        }
    }

    pub fn with_max_error_len(mut self, max_error_len: usize) -> Self {
        self.max_error_len = max_error_len;
        self
    }

    /// Runs `begin → apply → mark` for one event.
    ///
    /// A mutation failure is recorded with `mark_failed` and then returned,
    /// so the caller can answer with a server error and the gateway retries.
    pub async fn process(&self, event: NewWebhookEvent) -> Result<ProcessOutcome, WebhookError> {
        if event.event_id.trim().is_empty() {
            return Err(WebhookError::ParseError("event id is required".to_string()));
        }

        let attempts = match self.ledger.begin(event.clone()).await? {
            BeginOutcome::Acquired { attempts } => attempts,
            BeginOutcome::AlreadyHandled(status) => {
                tracing::debug!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    status = %status,
                    "duplicate stripe event skipped"
                );
                return Ok(ProcessOutcome::Duplicate(status));
            }
        };

        match self.apply(&event.event_type, &event.event_object).await {
            Ok(mutation) => {
                self.ledger.mark_processed(&event.event_id).await?;
                tracing::info!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    attempts,
                    "stripe event processed"
                );
                Ok(ProcessOutcome::Processed { attempts, mutation })
            }
            Err(err) => {
                let message = truncate_error(&err.to_string(), self.max_error_len);
                if let Err(mark_err) = self.ledger.mark_failed(&event.event_id, &message).await {
                    tracing::error!(
                        event_id = %event.event_id,
                        error = %mark_err,
                        "failed to record webhook failure"
                    );
                }
                tracing::warn!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    attempts,
                    error = %message,
                    "stripe event failed"
                );
                Err(err)
            }
        }
    }

    /// Applies the mutation for one event, without touching the ledger.
    pub async fn apply(&self, event_type: &str, object: &Value) -> Result<Mutation, WebhookError> {
        let kind = StripeEventType::parse(event_type);
        if kind == StripeEventType::Unknown {
            return Ok(Mutation::Ignored);
        }

        let object = StripeObject::from_event(event_type, object)?;
        let user_id = self.resolve_user(event_type, &object).await?;
        let now = Utc::now();

        self.links
            .upsert_link(StripeLink::new(
                user_id.clone(),
                object.customer_id(),
                object.subscription_id(),
                now,
            ))
            .await?;

        match kind {
            StripeEventType::CustomerSubscriptionCreated
            | StripeEventType::CustomerSubscriptionUpdated => {
                let StripeObject::Subscription(sub) = &object else {
                    return Err(malformed(event_type, "subscription"));
                };
                let subscription =
                    Subscription::from_stripe(user_id, sub, object.customer_id(), now);
                self.subscriptions.upsert_by_user(subscription).await?;
                Ok(Mutation::SubscriptionUpserted)
            }
            StripeEventType::CustomerSubscriptionDeleted => {
                self.update_status(&user_id, STATUS_CANCELED, true).await
            }
            StripeEventType::InvoicePaymentFailed => {
                self.update_status(&user_id, STATUS_PAUSED, false).await
            }
            StripeEventType::InvoicePaymentSucceeded => {
                self.update_status(&user_id, STATUS_ACTIVE, false).await
            }
            StripeEventType::CheckoutSessionCompleted => {
                let StripeObject::CheckoutSession(session) = &object else {
                    return Err(malformed(event_type, "checkout session"));
                };
                let Some(content_id) = session.metadata.get("content_id") else {
                    return Ok(Mutation::LinkOnly);
                };
                let purchase = Purchase::completed(
                    session.id.clone(),
                    user_id,
                    content_id,
                    PurchaseType::parse(session.metadata.get("purchase_type")),
                    now,
                )
                .with_amount(session.amount_total, &session.currency);
                let purchase_id = purchase.id.clone();
                self.purchases.upsert_purchase(purchase).await?;
                Ok(Mutation::PurchaseRecorded { purchase_id })
            }
            StripeEventType::Unknown => Ok(Mutation::Ignored),
        }
    }

    async fn update_status(
        &self,
        user_id: &UserId,
        status: &str,
        cancel_at_period_end: bool,
    ) -> Result<Mutation, WebhookError> {
        let matched = self
            .subscriptions
            .update_status_by_user(
                user_id,
                &SubscriptionStatusUpdate::new(status, cancel_at_period_end),
            )
            .await?;
        if !matched {
            tracing::debug!(user_id = %user_id, status, "no subscription to update");
        }
        Ok(Mutation::SubscriptionStatus {
            status: status.to_string(),
            matched,
        })
    }

    /// `metadata.user_id` first, then the Stripe link (subscription id before customer id).
    async fn resolve_user(
        &self,
        event_type: &str,
        object: &StripeObject,
    ) -> Result<UserId, WebhookError> {
        if let Some(user_id) = object.metadata_user_id() {
            if let Ok(user_id) = UserId::new(user_id) {
                return Ok(user_id);
            }
        }

        self.links
            .resolve_user(object.customer_id(), object.subscription_id())
            .await?
            .ok_or_else(|| WebhookError::UserUnresolved {
                event_type: event_type.to_string(),
                customer_id: object.customer_id().to_string(),
                subscription_id: object.subscription_id().to_string(),
            })
    }
}

fn malformed(event_type: &str, expected: &str) -> WebhookError {
    WebhookError::MalformedObject(format!("{} expected a {} object", event_type, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryPaymentStore, InMemoryWebhookEventStore};
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;
    use chrono::DateTime;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Subscription repository that fails writes until switched off.
    struct FlakySubscriptions {
        inner: InMemoryPaymentStore,
        failing: AtomicBool,
    }

    impl FlakySubscriptions {
        fn failing() -> Self {
            Self {
                inner: InMemoryPaymentStore::new(),
                failing: AtomicBool::new(true),
            }
        }

        fn recover(&self) {
            self.failing.store(false, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), DomainError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(DomainError::database("connection reset"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SubscriptionRepository for FlakySubscriptions {
        async fn upsert_by_user(&self, subscription: Subscription) -> Result<(), DomainError> {
            self.check()?;
            self.inner.upsert_by_user(subscription).await
        }

        async fn update_status_by_user(
            &self,
            user_id: &UserId,
            update: &SubscriptionStatusUpdate,
        ) -> Result<bool, DomainError> {
            self.check()?;
            self.inner.update_status_by_user(user_id, update).await
        }

        async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
            self.inner.find_by_user(user_id).await
        }
    }

    #[async_trait]
    impl PurchaseRepository for FlakySubscriptions {
        async fn upsert_purchase(&self, purchase: Purchase) -> Result<(), DomainError> {
            self.inner.upsert_purchase(purchase).await
        }

        async fn list_active_by_user(
            &self,
            user_id: &UserId,
            now: DateTime<Utc>,
        ) -> Result<Vec<Purchase>, DomainError> {
            self.inner.list_active_by_user(user_id, now).await
        }
    }

    struct Fixture {
        ledger: Arc<InMemoryWebhookEventStore>,
        store: Arc<InMemoryPaymentStore>,
        processor: WebhookProcessor,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryWebhookEventStore::new());
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor = WebhookProcessor::new(
            ledger.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        Fixture {
            ledger,
            store,
            processor,
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn event(id: &str, event_type: &str, object: Value) -> NewWebhookEvent {
        NewWebhookEvent {
            event_id: id.to_string(),
            event_type: event_type.to_string(),
            payload_hash: format!("hash-{}", id),
            event_object: object,
        }
    }

    fn subscription_object(status: &str) -> Value {
        json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": status,
            "current_period_start": 1_700_000_000,
            "current_period_end": 1_702_592_000,
            "items": {"data": [{"plan": {"id": "tier3"}}]},
            "metadata": {"user_id": "u1"}
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Ledger Protocol
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn processes_new_event_and_marks_processed() {
        let f = fixture();

        let outcome = f
            .processor
            .process(event(
                "evt_1",
                "customer.subscription.created",
                subscription_object("active"),
            ))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Processed {
                attempts: 1,
                mutation: Mutation::SubscriptionUpserted
            }
        );
        let entry = f.ledger.find("evt_1").await.unwrap().unwrap();
        assert_eq!(entry.status, WebhookStatus::Processed);
    }

    #[tokio::test]
    async fn duplicate_delivery_applies_mutation_once() {
        let f = fixture();
        let evt = event(
            "evt_1",
            "customer.subscription.updated",
            subscription_object("active"),
        );

        f.processor.process(evt.clone()).await.unwrap();
        let second = f.processor.process(evt).await.unwrap();

        assert_eq!(second, ProcessOutcome::Duplicate(WebhookStatus::Processed));
        assert_eq!(f.store.mutation_count(), 1);
        assert_eq!(f.ledger.find("evt_1").await.unwrap().unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn failure_is_recorded_then_retry_succeeds() {
        let ledger = Arc::new(InMemoryWebhookEventStore::new());
        let links = Arc::new(InMemoryPaymentStore::new());
        let flaky = Arc::new(FlakySubscriptions::failing());
        let processor = WebhookProcessor::new(ledger.clone(), links, flaky.clone(), flaky.clone());
        let evt = event(
            "evt_1",
            "customer.subscription.updated",
            subscription_object("active"),
        );

        let err = processor.process(evt.clone()).await.unwrap_err();
        assert!(matches!(err, WebhookError::Database(_)));
        let failed = ledger.find("evt_1").await.unwrap().unwrap();
        assert_eq!(failed.status, WebhookStatus::Failed);
        assert!(failed.last_error.unwrap().contains("connection reset"));

        flaky.recover();
        let outcome = processor.process(evt).await.unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Processed {
                attempts: 2,
                mutation: Mutation::SubscriptionUpserted
            }
        );
        assert_eq!(flaky.inner.mutation_count(), 1);
    }

    #[tokio::test]
    async fn stored_error_is_truncated() {
        let ledger = Arc::new(InMemoryWebhookEventStore::new());
        let store = Arc::new(InMemoryPaymentStore::new());
        let processor =
            WebhookProcessor::new(ledger.clone(), store.clone(), store.clone(), store)
                .with_max_error_len(20);

        processor
            .process(event(
                "evt_1",
                "invoice.payment_failed",
                json!({"customer": "cus_nobody_knows_this_customer"}),
            ))
            .await
            .unwrap_err();

        let entry = ledger.find("evt_1").await.unwrap().unwrap();
        assert_eq!(entry.last_error.unwrap().chars().count(), 20);
    }

    #[tokio::test]
    async fn payload_mismatch_is_rejected_without_mutation() {
        let f = fixture();
        let mut evt = event(
            "evt_1",
            "customer.subscription.updated",
            subscription_object("active"),
        );
        f.processor.process(evt.clone()).await.unwrap();

        evt.payload_hash = "different".to_string();
        let err = f.processor.process(evt).await.unwrap_err();

        assert_eq!(err, WebhookError::PayloadMismatch("evt_1".to_string()));
        assert_eq!(f.store.mutation_count(), 1);
    }

    #[tokio::test]
    async fn blank_event_id_is_rejected_before_ledger() {
        let f = fixture();

        let err = f
            .processor
            .process(event(" ", "invoice.payment_failed", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::ParseError(_)));
        assert!(f.ledger.is_empty().await);
    }

    // ══════════════════════════════════════════════════════════════
    // Event Mapping
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_event_upserts_normalized_subscription() {
        let f = fixture();

        f.processor
            .apply(
                "customer.subscription.updated",
                &subscription_object("past_due"),
            )
            .await
            .unwrap();

        let sub = f.store.find_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(sub.status, STATUS_PAUSED);
        assert_eq!(sub.plan_id, "tier3");
        assert_eq!(sub.stripe_subscription_id, "sub_1");
        assert_eq!(sub.current_period_end.timestamp(), 1_702_592_000);
        let link = f.store.link_for(&user("u1")).await.unwrap();
        assert_eq!(link.customer_id, "cus_1");
        assert_eq!(link.subscription_id, "sub_1");
    }

    #[tokio::test]
    async fn invoice_events_resolve_user_through_link() {
        let f = fixture();
        f.processor
            .apply(
                "customer.subscription.created",
                &subscription_object("active"),
            )
            .await
            .unwrap();

        let failed = f
            .processor
            .apply(
                "invoice.payment_failed",
                &json!({"customer": "cus_other", "subscription": "sub_1"}),
            )
            .await
            .unwrap();

        assert_eq!(
            failed,
            Mutation::SubscriptionStatus {
                status: STATUS_PAUSED.to_string(),
                matched: true
            }
        );
        let sub = f.store.find_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(sub.status, STATUS_PAUSED);
        let link = f.store.link_for(&user("u1")).await.unwrap();
        assert_eq!(link.customer_id, "cus_other");
        assert_eq!(link.subscription_id, "sub_1");

        f.processor
            .apply("invoice.payment_succeeded", &json!({"customer": "cus_other"}))
            .await
            .unwrap();
        let sub = f.store.find_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(sub.status, STATUS_ACTIVE);
        assert!(!sub.cancel_at_period_end);
    }

    #[tokio::test]
    async fn subscription_deleted_cancels_at_period_end() {
        let f = fixture();
        f.processor
            .apply(
                "customer.subscription.created",
                &subscription_object("active"),
            )
            .await
            .unwrap();

        f.processor
            .apply(
                "customer.subscription.deleted",
                &subscription_object("canceled"),
            )
            .await
            .unwrap();

        let sub = f.store.find_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(sub.status, STATUS_CANCELED);
        assert!(sub.cancel_at_period_end);
    }

    #[tokio::test]
    async fn status_update_without_subscription_is_a_no_op() {
        let f = fixture();

        let mutation = f
            .processor
            .apply(
                "invoice.payment_succeeded",
                &json!({"customer": "cus_1", "metadata": {"user_id": "u1"}}),
            )
            .await
            .unwrap();

        assert_eq!(
            mutation,
            Mutation::SubscriptionStatus {
                status: STATUS_ACTIVE.to_string(),
                matched: false
            }
        );
        assert!(f.store.find_by_user(&user("u1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unresolved_user_is_an_error() {
        let f = fixture();

        let err = f
            .processor
            .apply(
                "invoice.payment_failed",
                &json!({"customer": "cus_x", "subscription": "sub_x"}),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            WebhookError::UserUnresolved {
                event_type: "invoice.payment_failed".to_string(),
                customer_id: "cus_x".to_string(),
                subscription_id: "sub_x".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn checkout_with_content_records_rental() {
        let f = fixture();

        let mutation = f
            .processor
            .apply(
                "checkout.session.completed",
                &json!({
                    "id": "cs_1",
                    "customer": "cus_1",
                    "amount_total": 399,
                    "currency": "USD",
                    "metadata": {"user_id": "u1", "content_id": "movie-1", "purchase_type": "rent"}
                }),
            )
            .await
            .unwrap();

        assert_eq!(
            mutation,
            Mutation::PurchaseRecorded {
                purchase_id: "cs_1".to_string()
            }
        );
        let purchases = f.store.purchases_for(&user("u1")).await;
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].purchase_type, PurchaseType::Rent);
        assert_eq!(purchases[0].amount, Some(399));
        assert_eq!(purchases[0].currency, "usd");
        assert!(purchases[0].expires_at.is_some());
    }

    #[tokio::test]
    async fn checkout_without_content_only_links_customer() {
        let f = fixture();

        let mutation = f
            .processor
            .apply(
                "checkout.session.completed",
                &json!({
                    "id": "cs_1",
                    "customer": "cus_1",
                    "subscription": "sub_1",
                    "metadata": {"user_id": "u1"}
                }),
            )
            .await
            .unwrap();

        assert_eq!(mutation, Mutation::LinkOnly);
        assert_eq!(f.store.mutation_count(), 0);
        let link = f.store.link_for(&user("u1")).await.unwrap();
        assert_eq!(link.subscription_id, "sub_1");
    }

    #[tokio::test]
    async fn unknown_event_type_is_ignored_without_lookup() {
        let f = fixture();

        let mutation = f
            .processor
            .apply("customer.created", &json!("not even an object"))
            .await
            .unwrap();

        assert_eq!(mutation, Mutation::Ignored);
    }

    #[tokio::test]
    async fn non_object_payload_is_malformed() {
        let f = fixture();

        let err = f
            .processor
            .apply("invoice.payment_failed", &json!([1, 2, 3]))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::MalformedObject(_)));
    }
}
