//! Tolerant serde field readers for loosely-typed upstream payloads.
//!
//! Each reader accepts any JSON value and falls back to an empty/absent
//! value when the shape is unexpected, instead of failing the whole
//! document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Strings as-is; anything else reads as empty.
pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Non-blank strings; anything else reads as `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Only a JSON `true` is true.
pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// Positive unix seconds (integer or float); anything else reads as `None`.
pub fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let secs = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64));
    Ok(secs.filter(|s| *s > 0))
}

/// RFC 3339 string or a `{"$date": "<rfc3339>"}` wrapper.
pub fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(parse_timestamp(&Value::deserialize(deserializer)?))
}

/// Reads a timestamp value; invalid or empty values are `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("$date")?.as_str()?,
        _ => return None,
    };
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
