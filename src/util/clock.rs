//! Wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, Utc};

/// Milliseconds since the Unix epoch.
///
/// Returns 0 if the system clock reads earlier than the epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Current service date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
