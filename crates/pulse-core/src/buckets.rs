//! Time-bucket alignment for the historical archive.
//!
//! Archive keys are Unix timestamps aligned to the start of their
//! bucket in UTC: top of the hour, midnight, or midnight on Monday.

use chrono::{DateTime, Datelike, Utc};

const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;

/// Start of the hour containing `at`, as a Unix timestamp.
pub fn hour_bucket(at: DateTime<Utc>) -> i64 {
    align(at.timestamp(), HOUR_SECS)
}

/// Start of the UTC day containing `at`, as a Unix timestamp.
pub fn day_bucket(at: DateTime<Utc>) -> i64 {
    align(at.timestamp(), DAY_SECS)
}

/// Start of the ISO week (Monday 00:00 UTC) containing `at`.
pub fn week_bucket(at: DateTime<Utc>) -> i64 {
    let days_back = i64::from(at.weekday().num_days_from_monday());
    day_bucket(at).saturating_sub(days_back.saturating_mul(DAY_SECS))
}

const fn align(timestamp: i64, step: i64) -> i64 {
    timestamp.saturating_sub(timestamp.rem_euclid(step))
}
