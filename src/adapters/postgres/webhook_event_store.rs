//! PostgreSQL implementation of WebhookEventStore.
//!
//! The `event_id` primary key is what makes `begin` atomic: the insert
//! either creates the row or does nothing, and a reclaim is a conditional
//! update that only succeeds against the exact row version that was read.
//! Concurrent callers racing for the same event therefore see exactly one
//! `Acquired`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::payments::{
    decide_begin, BeginDecision, BeginOutcome, NewWebhookEvent, WebhookEvent, WebhookStatus,
};
use crate::ports::WebhookEventStore;

const EVENT_COLUMNS: &str = "event_id, event_type, payload_hash, status, attempts, last_error, \
     event_object, created_at, updated_at, processed_at";

/// PostgreSQL-backed webhook ledger (`stripe_webhook_events`).
pub struct PostgresWebhookEventStore {
    pool: PgPool,
    stale_processing_after: Option<Duration>,
}

impl PostgresWebhookEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            stale_processing_after: None,
        }
    }

    /// Reclaim `processing` rows untouched for at least `after`.
    pub fn with_stale_processing_after(mut self, after: Option<Duration>) -> Self {
        self.stale_processing_after = after;
        self
    }

    async fn fetch(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        let sql = format!(
            "SELECT {} FROM stripe_webhook_events WHERE event_id = $1",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, WebhookEventRow>(&sql)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to load webhook event: {}", e)))?
            .map(WebhookEvent::try_from)
            .transpose()
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    payload_hash: String,
    status: String,
    attempts: i32,
    last_error: Option<String>,
    event_object: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WebhookEventRow> for WebhookEvent {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let status: WebhookStatus = row
            .status
            .parse()
            .map_err(|e| DomainError::database(format!("Invalid webhook status: {}", e)))?;

        Ok(WebhookEvent {
            event_id: row.event_id,
            event_type: row.event_type,
            payload_hash: row.payload_hash,
            status,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
            last_error: row.last_error,
            event_object: row.event_object.unwrap_or(Value::Null),
            created_at: row.created_at,
            updated_at: row.updated_at,
            processed_at: row.processed_at,
        })
    }
}

fn object_param(object: &Value) -> Option<&Value> {
    (!object.is_null()).then_some(object)
}

#[async_trait]
impl WebhookEventStore for PostgresWebhookEventStore {
    async fn begin(&self, event: NewWebhookEvent) -> Result<BeginOutcome, DomainError> {
        let now = Utc::now();

        // 1. First sighting wins the insert
        let inserted: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO stripe_webhook_events (
                event_id, event_type, payload_hash, status, attempts, event_object,
                created_at, updated_at
            ) VALUES ($1, $2, $3, 'processing', 1, $4, $5, $5)
            ON CONFLICT (event_id) DO NOTHING
            RETURNING attempts
            "#,
        )
        .bind(&event.event_id)
        .bind(&event.event_type)
        .bind(&event.payload_hash)
        .bind(object_param(&event.event_object))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert webhook event: {}", e)))?;

        if inserted.is_some() {
            return Ok(BeginOutcome::Acquired { attempts: 1 });
        }

        // 2. Existing row: decide from what is stored
        let existing = self
            .fetch(&event.event_id)
            .await?
            .ok_or_else(|| DomainError::event_not_found(&event.event_id))?;

        match decide_begin(
            &existing,
            &event.payload_hash,
            now,
            self.stale_processing_after,
        ) {
            BeginDecision::Skip => Ok(BeginOutcome::AlreadyHandled(existing.status)),
            BeginDecision::PayloadMismatch => Err(DomainError::payload_mismatch(&event.event_id)),
            BeginDecision::Reclaim => {
                // 3. Only the caller that still sees the row as read may reclaim it
                let reclaimed: Option<i32> = sqlx::query_scalar(
                    r#"
                    UPDATE stripe_webhook_events SET
                        status = 'processing',
                        attempts = attempts + 1,
                        last_error = NULL,
                        event_type = COALESCE(NULLIF($2, ''), event_type),
                        event_object = COALESCE($3, event_object),
                        payload_hash = COALESCE(NULLIF($4, ''), payload_hash),
                        updated_at = $5
                    WHERE event_id = $1 AND status = $6 AND updated_at = $7
                    RETURNING attempts
                    "#,
                )
                .bind(&event.event_id)
                .bind(&event.event_type)
                .bind(object_param(&event.event_object))
                .bind(&event.payload_hash)
                .bind(now)
                .bind(existing.status.as_str())
                .bind(existing.updated_at)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to reclaim webhook event: {}", e))
                })?;

                Ok(match reclaimed {
                    Some(attempts) => BeginOutcome::Acquired {
                        attempts: u32::try_from(attempts).unwrap_or(0),
                    },
                    None => BeginOutcome::AlreadyHandled(WebhookStatus::Processing),
                })
            }
        }
    }

    async fn mark_processed(&self, event_id: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE stripe_webhook_events SET
                status = 'processed',
                last_error = NULL,
                processed_at = $2,
                updated_at = $2
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark webhook processed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::event_not_found(event_id));
        }
        Ok(())
    }

    async fn mark_failed(&self, event_id: &str, error: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE stripe_webhook_events SET
                status = 'failed',
                last_error = $2,
                updated_at = $3
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark webhook failed: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::event_not_found(event_id));
        }
        Ok(())
    }

    async fn list_failed(&self, limit: u32) -> Result<Vec<WebhookEvent>, DomainError> {
        let sql = format!(
            "SELECT {} FROM stripe_webhook_events WHERE status = 'failed' \
             ORDER BY updated_at ASC LIMIT $1",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, WebhookEventRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to list failed webhooks: {}", e)))?
            .into_iter()
            .map(WebhookEvent::try_from)
            .collect()
    }

    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        self.fetch(event_id).await
    }
}
