//! ProcessWebhookHandler - Command handler for inbound Stripe webhook deliveries.

use std::sync::Arc;

use crate::domain::payments::{
    payload_hash, NewWebhookEvent, StripeWebhookVerifier, WebhookError,
};

use super::webhook_processor::{ProcessOutcome, WebhookProcessor};

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// Result of a delivery that was verified and accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub outcome: ProcessOutcome,
}

/// Verifies, parses and processes webhook deliveries.
///
/// Without a signing secret every delivery is refused with `NotConfigured`;
/// signature and parse failures are rejected before the ledger is touched.
pub struct ProcessWebhookHandler {
    verifier: Option<Arc<StripeWebhookVerifier>>,
    processor: Arc<WebhookProcessor>,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: Option<Arc<StripeWebhookVerifier>>,
        processor: Arc<WebhookProcessor>,
    ) -> Self {
        Self {
            verifier,
            processor,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let verifier = self.verifier.as_ref().ok_or(WebhookError::NotConfigured)?;

        // 1. Signature and envelope; rejections never reach the ledger
        let event = verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        // 2. Ledger protocol and mutation
        let outcome = self
            .processor
            .process(NewWebhookEvent {
                event_id: event.id.clone(),
                event_type: event.event_type.clone(),
                payload_hash: payload_hash(&cmd.payload),
                event_object: event.data.object,
            })
            .await?;

        Ok(ProcessWebhookResult {
            event_id: event.id,
            event_type: event.event_type,
            outcome,
        })
    }
}
