//! Subscription status vocabulary.
//!
//! Stripe reports `active`, `past_due`, `canceled`, `trialing`, `unpaid`
//! and more. Only three values are mapped onto internal statuses; the
//! rest are stored as Stripe sent them.

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PAUSED: &str = "paused";
pub const STATUS_CANCELED: &str = "canceled";

/// Maps a Stripe subscription status onto the internal vocabulary.
///
/// Matching is case-insensitive; unmapped values pass through unchanged.
pub fn normalize_subscription_status(status: &str) -> String {
    let lowered = status.to_lowercase();
    match lowered.as_str() {
        "active" => STATUS_ACTIVE.to_string(),
        "past_due" => STATUS_PAUSED.to_string(),
        "canceled" => STATUS_CANCELED.to_string(),
        _ => status.to_string(),
    }
}
