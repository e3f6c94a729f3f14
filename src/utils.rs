//! Utility functions for the gatekeeper service

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Generate a new unique request ID for log correlation
pub fn generate_request_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Truthiness of a JSON value as Studio widgets send it
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse a JSON-encoded flag parameter; empty or malformed input is `false`
pub fn json_flag(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw)
        .map(|value| is_truthy(&value))
        .unwrap_or(false)
}

/// Parse the `QueueTime` parameter
///
/// A blank value counts as zero seconds; anything non-numeric is `None`.
pub fn parse_queue_time(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|secs| !secs.is_nan())
}
