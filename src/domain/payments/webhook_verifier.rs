//! Stripe webhook signature verification.
//!
//! Verifies `Stripe-Signature` headers (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
//! using HMAC-SHA256 over `"{t}.{body}"` with a constant-time comparison,
//! and rejects signatures whose timestamp is outside the tolerance window.

use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Default signature freshness window (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every well-formed v1 signature (several during secret rotation).
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Whitespace around parts is ignored, as are unknown schemes. A `v1`
    /// entry that is not valid hex can never match and is skipped.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::SignatureInvalid` when the header is empty,
    /// the timestamp is missing or not an integer, or no usable v1
    /// signature is present.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        if header.trim().is_empty() {
            return Err(invalid("missing Stripe-Signature header"));
        }

        let mut timestamp: Option<&str> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',').map(str::trim) {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value),
                "v1" => {
                    if let Ok(sig) = hex::decode(value) {
                        v1_signatures.push(sig);
                    }
                }
                _ => {
                    // v0 and future schemes are not trusted
                }
            }
        }

        let timestamp = timestamp
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("missing timestamp"))?
            .parse::<i64>()
            .map_err(|_| invalid("invalid timestamp"))?;

        if v1_signatures.is_empty() {
            return Err(invalid("missing v1 signature"));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    /// Creates a verifier with the default 5 minute tolerance.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS as i64,
        }
    }

    /// Overrides the freshness window.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance_secs = i64::try_from(tolerance.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// Verifies the signature against the current wall clock.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Verifies the signature as of `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// - `SignatureInvalid` - malformed header or no v1 signature matched
    /// - `SignatureStale` - `|now - t|` exceeds the tolerance
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        if now.saturating_sub(header.timestamp).abs() > self.tolerance_secs {
            return Err(WebhookError::SignatureStale);
        }

        let expected = compute_signature(
            self.secret.expose_secret().as_bytes(),
            header.timestamp,
            payload,
        )?;

        if header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            Ok(())
        } else {
            Err(invalid("no matching signature"))
        }
    }

    /// Verifies the signature, then parses the event envelope.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify(payload, signature_header)?;
        StripeEvent::parse(payload)
    }
}

/// SHA-256 hex digest of a raw webhook body.
///
/// Stored on the ledger to detect an event id being reused with a
/// different body.
pub fn payload_hash(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"` under `secret`.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
    compute_signature(secret.as_bytes(), timestamp, payload).map(hex::encode)
}

/// Complete `Stripe-Signature` header value for a payload.
pub fn signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, WebhookError> {
    Ok(format!(
        "t={},v1={}",
        timestamp,
        sign_payload(secret, timestamp, payload)?
    ))
}

fn compute_signature(key: &[u8], timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|_| invalid("unusable signing secret"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn invalid(reason: &str) -> WebhookError {
    WebhookError::SignatureInvalid(reason.to_string())
}
