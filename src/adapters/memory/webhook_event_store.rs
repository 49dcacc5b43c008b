//! In-memory webhook ledger.
//!
//! `begin` runs entirely under the map's write lock, so for a given event id
//! exactly one concurrent caller observes `Acquired`. Intended for tests and
//! local runs without a database.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::payments::{
    decide_begin, BeginDecision, BeginOutcome, NewWebhookEvent, WebhookEvent, WebhookStatus,
};
use crate::ports::WebhookEventStore;

/// Ledger backed by a `HashMap` keyed by event id.
#[derive(Default)]
pub struct InMemoryWebhookEventStore {
    events: RwLock<HashMap<String, WebhookEvent>>,
    stale_processing_after: Option<Duration>,
}

impl InMemoryWebhookEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reclaim `processing` entries untouched for at least `after`.
    pub fn with_stale_processing_after(mut self, after: Duration) -> Self {
        self.stale_processing_after = Some(after);
        self
    }

    // === Test Helpers ===

    /// Stores an entry as-is, replacing any existing one.
    pub async fn insert(&self, event: WebhookEvent) {
        self.events
            .write()
            .await
            .insert(event.event_id.clone(), event);
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn update<F>(&self, event_id: &str, apply: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut WebhookEvent, DateTime<Utc>),
    {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| DomainError::event_not_found(event_id))?;
        apply(event, Utc::now());
        Ok(())
    }
}

#[async_trait]
impl WebhookEventStore for InMemoryWebhookEventStore {
    async fn begin(&self, event: NewWebhookEvent) -> Result<BeginOutcome, DomainError> {
        let now = Utc::now();
        let mut events = self.events.write().await;

        match events.entry(event.event_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(WebhookEvent::first_attempt(event, now));
                Ok(BeginOutcome::Acquired { attempts: 1 })
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match decide_begin(
                    existing,
                    &event.payload_hash,
                    now,
                    self.stale_processing_after,
                ) {
                    BeginDecision::Skip => Ok(BeginOutcome::AlreadyHandled(existing.status)),
                    BeginDecision::Reclaim => {
                        existing.reclaim(&event, now);
                        Ok(BeginOutcome::Acquired {
                            attempts: existing.attempts,
                        })
                    }
                    BeginDecision::PayloadMismatch => {
                        Err(DomainError::payload_mismatch(&event.event_id))
                    }
                }
            }
        }
    }

    async fn mark_processed(&self, event_id: &str) -> Result<(), DomainError> {
        self.update(event_id, |event, now| event.mark_processed(now))
            .await
    }

    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<(), DomainError> {
        self.update(event_id, |event, now| event.mark_failed(error, now))
            .await
    }

    async fn list_failed(&self, limit: u32) -> Result<Vec<WebhookEvent>, DomainError> {
        let events = self.events.read().await;
        let mut failed: Vec<WebhookEvent> = events
            .values()
            .filter(|e| e.status == WebhookStatus::Failed)
            .cloned()
            .collect();
        failed.sort_by_key(|e| e.updated_at);
        failed.truncate(limit as usize);
        Ok(failed)
    }

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        Ok(self.events.read().await.get(event_id).cloned())
    }
}
