//! ReconciliationWorker - periodic re-drive of failed webhook events.
//!
//! Each tick lists up to `batch_size` failed ledger entries and pushes them
//! back through the processor. Ticks never overlap: a batch finishes before
//! the next one is scheduled.
//!
//! ## Data Residency
//!
//! Under `strict` residency the worker refuses to start unless its region is
//! on the allow-list. An empty allow-list admits nothing.
//!
//! ## Graceful Shutdown
//!
//! The worker listens on a watch channel and stops between batches.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::application::{
    ReplayFailedWebhooksCommand, ReplayFailedWebhooksHandler, ReplaySummary,
};
use crate::config::{ReconciliationConfig, ResidencyMode};
use crate::domain::foundation::DomainError;

/// Reasons the worker refuses to run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("region {region} is not allowed to process payment data under strict residency")]
    ResidencyViolation { region: String },
}

/// Background service that replays failed webhook events.
pub struct ReconciliationWorker {
    config: ReconciliationConfig,
    replay: Arc<ReplayFailedWebhooksHandler>,
}

impl ReconciliationWorker {
    pub fn new(config: ReconciliationConfig, replay: Arc<ReplayFailedWebhooksHandler>) -> Self {
        Self { config, replay }
    }

    /// Fails when strict residency excludes this region.
    pub fn check_residency(&self) -> Result<(), WorkerError> {
        if self.config.residency_allows_region() {
            return Ok(());
        }
        Err(WorkerError::ResidencyViolation {
            region: self.config.region(),
        })
    }

    /// Run until the shutdown signal flips to `true` or its sender is dropped.
    ///
    /// The first batch runs immediately. A disabled worker returns at once.
    ///
    /// # Errors
    ///
    /// `ResidencyViolation` before any batch runs.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        if !self.config.enabled {
            tracing::info!("reconciliation worker disabled");
            return Ok(());
        }
        if let Err(err) = self.check_residency() {
            tracing::error!(
                region = %self.config.region(),
                allowed_regions = ?self.config.allowed_regions,
                "reconciliation worker refused to start"
            );
            return Err(err);
        }

        tracing::info!(
            region = %self.config.region(),
            strict = self.config.residency_mode == ResidencyMode::Strict,
            interval_secs = self.config.interval_secs,
            batch_size = self.config.batch_size,
            "reconciliation worker started"
        );

        let mut interval = time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(err) = self.run_once().await {
                        tracing::warn!(error = %err, "reconciliation batch failed");
                    }
                }
            }
        }

        tracing::info!("reconciliation worker stopped");
        Ok(())
    }

    /// Replay one batch of failed events.
    pub async fn run_once(&self) -> Result<ReplaySummary, DomainError> {
        let summary = self
            .replay
            .handle(ReplayFailedWebhooksCommand {
                limit: self.config.batch_size,
            })
            .await?;

        if summary.listed > 0 {
            tracing::info!(
                listed = summary.listed,
                replayed = summary.replayed,
                skipped = summary.skipped,
                failed = summary.failed,
                "reconciliation batch complete"
            );
        }
        Ok(summary)
    }
}
