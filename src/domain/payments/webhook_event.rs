//! Webhook idempotency ledger entries and their state machine.
//!
//! ```text
//! (absent) --begin--> processing --mark_processed--> processed
//!                         |  ^
//!           mark_failed   v  | begin (attempts + 1)
//!                        failed
//! ```
//!
//! `processed` is terminal. A `processing` entry is skipped unless stale
//! reclaim is enabled and it has not been touched for the configured age.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::ValidationError;

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Processing,
    Processed,
    Failed,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Processing => "processing",
            WebhookStatus::Processed => "processed",
            WebhookStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(WebhookStatus::Processing),
            "processed" => Ok(WebhookStatus::Processed),
            "failed" => Ok(WebhookStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown webhook status '{}'", other),
            )),
        }
    }
}

/// Input to `begin`: what the current delivery knows about the event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhookEvent {
    pub event_id: String,
    pub event_type: String,
    /// SHA-256 hex of the raw body; empty for replays that reuse the stored hash.
    pub payload_hash: String,
    /// `data.object`, kept so the event can be re-driven later.
    pub event_object: Value,
}

/// One ledger entry per Stripe event id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    pub event_id: String,
    pub event_type: String,
    pub payload_hash: String,
    pub status: WebhookStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub event_object: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    /// First sighting: `processing` with one attempt.
    pub fn first_attempt(new: NewWebhookEvent, now: DateTime<Utc>) -> Self {
        Self {
            event_id: new.event_id,
            event_type: new.event_type,
            payload_hash: new.payload_hash,
            status: WebhookStatus::Processing,
            attempts: 1,
            last_error: None,
            event_object: new.event_object,
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }

    /// Takes the entry back to `processing` for another attempt.
    ///
    /// Supplied type, object and hash replace the stored ones unless empty.
    pub fn reclaim(&mut self, incoming: &NewWebhookEvent, now: DateTime<Utc>) {
        self.status = WebhookStatus::Processing;
        self.attempts += 1;
        self.last_error = None;
        if !incoming.event_type.is_empty() {
            self.event_type = incoming.event_type.clone();
        }
        if !incoming.event_object.is_null() {
            self.event_object = incoming.event_object.clone();
        }
        if !incoming.payload_hash.is_empty() {
            self.payload_hash = incoming.payload_hash.clone();
        }
        self.updated_at = now;
    }

    pub fn mark_processed(&mut self, now: DateTime<Utc>) {
        self.status = WebhookStatus::Processed;
        self.last_error = None;
        self.processed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = WebhookStatus::Failed;
        self.last_error = Some(error.into());
        self.updated_at = now;
    }

    /// Request to re-drive this entry through `begin`.
    ///
    /// The hash is left empty so the stored one is kept.
    pub fn replay_request(&self) -> NewWebhookEvent {
        NewWebhookEvent {
            event_id: self.event_id.clone(),
            event_type: self.event_type.clone(),
            payload_hash: String::new(),
            event_object: self.event_object.clone(),
        }
    }
}

/// What `begin` decided for an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginDecision {
    /// Duplicate delivery or in-flight elsewhere; caller acknowledges.
    Skip,
    /// Caller takes ownership of a new attempt.
    Reclaim,
    /// Same event id, different body.
    PayloadMismatch,
}

/// Rules for an existing ledger entry.
///
/// The hash comparison applies whenever both hashes are known, whatever
/// the status, so a reused event id is never acknowledged as a duplicate.
pub fn decide_begin(
    existing: &WebhookEvent,
    incoming_hash: &str,
    now: DateTime<Utc>,
    stale_processing_after: Option<Duration>,
) -> BeginDecision {
    if !existing.payload_hash.is_empty()
        && !incoming_hash.is_empty()
        && existing.payload_hash != incoming_hash
    {
        return BeginDecision::PayloadMismatch;
    }

    match existing.status {
        WebhookStatus::Processed => BeginDecision::Skip,
        WebhookStatus::Failed => BeginDecision::Reclaim,
        WebhookStatus::Processing => match stale_processing_after {
            Some(after) if is_stale(existing.updated_at, now, after) => BeginDecision::Reclaim,
            _ => BeginDecision::Skip,
        },
    }
}

fn is_stale(updated_at: DateTime<Utc>, now: DateTime<Utc>, after: Duration) -> bool {
    match chrono::Duration::from_std(after) {
        Ok(after) => now - updated_at >= after,
        Err(_) => false,
    }
}

/// Result of `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// This caller owns the attempt and must mark it processed or failed.
    Acquired { attempts: u32 },
    /// Someone else handled or is handling the event.
    AlreadyHandled(WebhookStatus),
}

impl BeginOutcome {
    pub fn should_process(&self) -> bool {
        matches!(self, BeginOutcome::Acquired { .. })
    }
}

/// Caps an error message at `max_chars` characters.
pub fn truncate_error(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => message[..byte_idx].to_string(),
        None => message.to_string(),
    }
}
