//! ReplayFailedWebhooksHandler - re-drives failed ledger entries.
//!
//! Each failed entry goes back through the same `begin → apply → mark`
//! protocol as an inline delivery, with an empty payload hash so the stored
//! hash is kept. Individual failures are logged and counted; the batch
//! always runs to the end.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::WebhookEventStore;

use super::webhook_processor::{ProcessOutcome, WebhookProcessor};

/// Command to replay up to `limit` failed events.
#[derive(Debug, Clone, Copy)]
pub struct ReplayFailedWebhooksCommand {
    pub limit: u32,
}

/// Counts for one replay batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Failed entries returned by the ledger.
    pub listed: usize,
    /// Entries processed successfully by this batch.
    pub replayed: usize,
    /// Entries another caller took over first.
    pub skipped: usize,
    /// Entries that failed again.
    pub failed: usize,
}

pub struct ReplayFailedWebhooksHandler {
    ledger: Arc<dyn WebhookEventStore>,
    processor: Arc<WebhookProcessor>,
}

impl ReplayFailedWebhooksHandler {
    pub fn new(ledger: Arc<dyn WebhookEventStore>, processor: Arc<WebhookProcessor>) -> Self {
        Self { ledger, processor }
    }

    /// Only listing the failed entries can fail the whole batch.
    pub async fn handle(
        &self,
        cmd: ReplayFailedWebhooksCommand,
    ) -> Result<ReplaySummary, DomainError> {
        let failed = self.ledger.list_failed(cmd.limit).await?;
        let mut summary = ReplaySummary {
            listed: failed.len(),
            ..ReplaySummary::default()
        };

        for event in failed {
            match self.processor.process(event.replay_request()).await {
                Ok(ProcessOutcome::Processed { .. }) => summary.replayed += 1,
                Ok(ProcessOutcome::Duplicate(_)) => summary.skipped += 1,
                Err(err) => {
                    tracing::warn!(
                        event_id = %event.event_id,
                        event_type = %event.event_type,
                        error = %err,
                        "webhook replay failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
