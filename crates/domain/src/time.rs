//! Time and timestamp helpers.

use chrono::{DateTime, Duration, Utc};

/// UTC timestamp used for post times, poll periods, match events, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// `start` shifted forward by whole days.
#[must_use]
pub fn days_after(start: Timestamp, days: u32) -> Timestamp {
    start + Duration::days(i64::from(days))
}
