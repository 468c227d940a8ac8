//! Time utilities for message timestamps.

use chrono::Utc;

/// Current Unix timestamp in milliseconds (UTC).
pub fn now_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}
