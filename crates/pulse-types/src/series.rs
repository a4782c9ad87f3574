//! Historical-series selection: resolutions, metric fields, and the
//! `{timestamp, value}` points the series endpoint returns.
//!
//! Unrecognized resolution or metric names fall back to hourly and
//! active-user count respectively; the read path favors availability over
//! strictness.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::snapshot::{HistoricalArchive, ResolutionStats};

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Archive resolution selected by the `period` path parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    /// Buckets aligned to the top of the hour.
    #[default]
    Hourly,
    /// Buckets aligned to midnight.
    Daily,
    /// Buckets aligned to Monday midnight.
    Weekly,
}

impl Resolution {
    /// Parse a path parameter, falling back to [`Self::Hourly`] for anything
    /// unrecognized.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            _ => Self::Hourly,
        }
    }

    /// Select this resolution's bucket map from an archive.
    pub const fn series_of(self, archive: &HistoricalArchive) -> &BTreeMap<i64, ResolutionStats> {
        match self {
            Self::Hourly => &archive.hourly,
            Self::Daily => &archive.daily,
            Self::Weekly => &archive.weekly,
        }
    }
}

// ---------------------------------------------------------------------------
// Metric field
// ---------------------------------------------------------------------------

/// Archive field selected by the `metric` path parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricField {
    /// Active-user counts.
    #[default]
    ActiveUsers,
    /// Sale counts.
    Sales,
    /// Conversion percentages.
    ConversionRate,
    /// Response times in milliseconds.
    ResponseTime,
}

impl MetricField {
    /// Parse a path parameter, falling back to [`Self::ActiveUsers`] for
    /// anything unrecognized.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw {
            "sales" => Self::Sales,
            "conversionRate" => Self::ConversionRate,
            "responseTime" => Self::ResponseTime,
            _ => Self::ActiveUsers,
        }
    }

    /// Pull this field's value out of one archive bucket.
    pub const fn select(self, stats: &ResolutionStats) -> SeriesValue {
        match self {
            Self::ActiveUsers => SeriesValue::Count(stats.active_users),
            Self::Sales => SeriesValue::Count(stats.sales),
            Self::ConversionRate => SeriesValue::Rate(stats.conversion_rate),
            Self::ResponseTime => SeriesValue::Rate(stats.response_time_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Series points
// ---------------------------------------------------------------------------

/// One value of a historical series.
///
/// Untagged: counts serialize as JSON integers, rates as floats, exactly as
/// the archive stores them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(untagged)]
pub enum SeriesValue {
    /// Integer-valued series (users, sales).
    Count(u32),
    /// Fractional series (conversion rate, response time).
    Rate(f64),
}

/// One entry of the ordered series returned by the historical read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeriesPoint {
    /// Bucket-start time, unix seconds.
    pub timestamp: i64,
    /// The selected metric's value in that bucket.
    pub value: SeriesValue,
}
