//! The metrics snapshot and its historical archive.
//!
//! A [`Snapshot`] is one fully-formed, internally consistent set of metric
//! values for one point in time. Field names serialize in camelCase and must
//! stay stable: the dashboard and any drop-in client parse them byte for
//! byte.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One complete set of business and operational metrics for one instant.
///
/// Produced once per tick by the generator and never mutated afterwards.
/// Every snapshot embeds the full three-resolution [`HistoricalArchive`] by
/// value, so a freshly connected viewer can draw charts from its first frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Wall-clock time of generation, unix seconds.
    pub timestamp: i64,
    /// Currently active users across all regions.
    pub active_users: u32,
    /// Request throughput derived from the active-user count.
    pub requests_per_second: f64,
    /// Mean response time in milliseconds, clamped to 100..=5000.
    pub response_time_ms: f64,
    /// Visitor-to-sale conversion percentage, clamped to 0.5..=7.0.
    pub conversion_rate: f64,
    /// Completed sales this tick.
    pub sales: u32,
    /// Failed-request percentage.
    pub error_rate: f64,
    /// Error counts per category; values sum exactly to the tick's total.
    pub errors_by_type: BTreeMap<String, u32>,
    /// Server load percentage, capped at 100.
    pub server_load: f64,
    /// Open database connections.
    pub database_connections: u32,
    /// Per-region breakdown; user and sale sums match the top-level values.
    pub regional_data: BTreeMap<String, RegionStats>,
    /// Users per traffic source; sums to the top-level active-user count.
    pub sources_data: BTreeMap<String, u32>,
    /// Purchase funnel for this tick.
    pub conversion_funnel: ConversionFunnel,
    /// Multi-resolution history, cloned from the generator's archive.
    pub historical_data: HistoricalArchive,
}

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

/// Per-region slice of the top-level metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    /// Active users attributed to this region.
    pub active_users: u32,
    /// Sales attributed to this region.
    pub sales: u32,
    /// Regional conversion percentage (jittered around the top-level rate).
    pub conversion_rate: f64,
}

/// Purchase funnel stage counts, non-increasing from top to bottom.
///
/// `purchased_items` always equals the snapshot's `sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ConversionFunnel {
    /// Unique visitors entering the funnel (the active-user count).
    pub visitors: u32,
    /// Visitors who viewed a product page.
    pub product_views: u32,
    /// Visitors who added an item to the cart.
    pub added_to_cart: u32,
    /// Visitors who started checkout.
    pub began_checkout: u32,
    /// Completed purchases.
    pub purchased_items: u32,
}

// ---------------------------------------------------------------------------
// Historical archive
// ---------------------------------------------------------------------------

/// Aggregate metric values for one archive bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStats {
    /// Active users in the bucket.
    pub active_users: u32,
    /// Sales in the bucket.
    pub sales: u32,
    /// Conversion percentage in the bucket.
    pub conversion_rate: f64,
    /// Response time in the bucket, milliseconds.
    pub response_time_ms: f64,
}

/// Three-resolution history keyed by bucket-start timestamps.
///
/// Keys are unix seconds aligned to the top of the hour, midnight, and
/// Monday midnight respectively. Later writes to the same key overwrite.
/// Integer map keys serialize as JSON strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct HistoricalArchive {
    /// Hourly buckets covering roughly the trailing week.
    pub hourly: BTreeMap<i64, ResolutionStats>,
    /// Daily buckets, written at each backfilled midnight.
    pub daily: BTreeMap<i64, ResolutionStats>,
    /// Weekly buckets, written at each backfilled Monday midnight.
    pub weekly: BTreeMap<i64, ResolutionStats>,
}
