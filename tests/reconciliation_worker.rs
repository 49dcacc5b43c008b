//! Integration tests for the reconciliation worker's residency gate.
//!
//! A ledger wrapper counts every call so the tests can prove a refused
//! worker never reads or replays anything.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;

use streamverse_payments::adapters::memory::{InMemoryPaymentStore, InMemoryWebhookEventStore};
use streamverse_payments::adapters::{ReconciliationWorker, WorkerError};
use streamverse_payments::application::{ReplayFailedWebhooksHandler, WebhookProcessor};
use streamverse_payments::config::{ReconciliationConfig, ResidencyMode};
use streamverse_payments::domain::foundation::DomainError;
use streamverse_payments::domain::payments::{
    BeginOutcome, NewWebhookEvent, WebhookEvent, WebhookStatus,
};
use streamverse_payments::ports::WebhookEventStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct CountingLedger {
    inner: InMemoryWebhookEventStore,
    calls: AtomicUsize,
}

impl CountingLedger {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WebhookEventStore for CountingLedger {
    async fn begin(&self, event: NewWebhookEvent) -> Result<BeginOutcome, DomainError> {
        self.touch();
        self.inner.begin(event).await
    }

    async fn mark_processed(&self, event_id: &str) -> Result<(), DomainError> {
        self.touch();
        self.inner.mark_processed(event_id).await
    }

    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<(), DomainError> {
        self.touch();
        self.inner.mark_failed(event_id, error).await
    }

    async fn list_failed(&self, limit: u32) -> Result<Vec<WebhookEvent>, DomainError> {
        self.touch();
        self.inner.list_failed(limit).await
    }

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        self.inner.find(event_id).await
    }
}

fn worker(ledger: Arc<CountingLedger>, config: ReconciliationConfig) -> ReconciliationWorker {
    let store = Arc::new(InMemoryPaymentStore::new());
    let processor = Arc::new(WebhookProcessor::new(
        ledger.clone(),
        store.clone(),
        store.clone(),
        store,
    ));
    ReconciliationWorker::new(
        config,
        Arc::new(ReplayFailedWebhooksHandler::new(ledger, processor)),
    )
}

fn strict(region: &str, allowed: Option<&str>) -> ReconciliationConfig {
    ReconciliationConfig {
        enabled: true,
        interval_secs: 3600,
        region: region.to_string(),
        residency_mode: ResidencyMode::Strict,
        allowed_regions: allowed.map(str::to_string),
        ..Default::default()
    }
}

async fn seed_failed(ledger: &CountingLedger) {
    ledger
        .inner
        .begin(NewWebhookEvent {
            event_id: "evt_1".to_string(),
            event_type: "invoice.payment_failed".to_string(),
            payload_hash: "h".to_string(),
            event_object: json!({"customer": "cus_1"}),
        })
        .await
        .unwrap();
    ledger.inner.mark_failed("evt_1", "user unresolved").await.unwrap();
}

// =============================================================================
// Residency Gate
// =============================================================================

#[tokio::test]
async fn region_outside_allow_list_never_touches_the_ledger() {
    let ledger = Arc::new(CountingLedger::default());
    seed_failed(&ledger).await;
    let (_tx, rx) = watch::channel(false);

    let result = worker(ledger.clone(), strict("us-east-1", Some("eu-west-1,eu-central-1")))
        .run(rx)
        .await;

    assert!(matches!(result, Err(WorkerError::ResidencyViolation { .. })));
    assert_eq!(ledger.calls(), 0);
    let entry = ledger.inner.find("evt_1").await.unwrap().unwrap();
    assert_eq!(entry.status, WebhookStatus::Failed);
    assert_eq!(entry.attempts, 1);
}

#[tokio::test]
async fn empty_allow_list_fails_closed() {
    let ledger = Arc::new(CountingLedger::default());
    let (_tx, rx) = watch::channel(false);

    let result = worker(ledger.clone(), strict("eu-west-1", Some(""))).run(rx).await;

    assert!(result.is_err());
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn allowed_region_replays_and_shuts_down() {
    let ledger = Arc::new(CountingLedger::default());
    seed_failed(&ledger).await;
    let worker = Arc::new(worker(ledger.clone(), strict("EU-West-1", Some("eu-west-1"))));
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run(rx).await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while ledger.inner.find("evt_1").await.unwrap().unwrap().attempts < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker should replay on start");

    tx.send(true).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
    assert!(ledger.calls() > 0);
}
