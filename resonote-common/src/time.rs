//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current Unix epoch time in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// True when a millisecond timestamp is at least `max_age` older than `now_ms`
///
/// Timestamps in the future are never expired.
pub fn is_expired(timestamp_ms: i64, max_age: Duration, now_ms: i64) -> bool {
    let age = now_ms.saturating_sub(timestamp_ms);
    age >= 0 && age as u128 >= max_age.as_millis()
}
