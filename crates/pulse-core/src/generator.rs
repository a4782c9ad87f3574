//! Coherent business-metrics generation.
//!
//! [`MetricsGenerator`] random-walks a full e-commerce snapshot from
//! tick to tick. Every derived figure is produced from the same walk,
//! so the stream stays internally consistent:
//!
//! - Regional and source counts rescale exactly to the tick totals
//! - The conversion funnel narrows stage by stage and its final stage
//!   equals the tick's sales
//! - Error counts sum exactly to the total implied by the error rate
//! - Load, latency, and throughput move together
//!
//! Generation is deterministic: two generators built with the same
//! parameters, base time, and seed produce identical snapshots for
//! identical call sequences.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use pulse_types::{
    ConversionFunnel, HistoricalArchive, MetricField, RegionStats, Resolution, ResolutionStats,
    SeriesPoint, Snapshot,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buckets;
use crate::params::GeneratorParams;

/// Floor for active users. The site is never entirely empty.
const MIN_ACTIVE_USERS: u32 = 10;

/// Conversion-rate clamp, in percent.
const CONVERSION_RATE_MIN: f64 = 0.5;
const CONVERSION_RATE_MAX: f64 = 7.0;

/// Response-time clamp, in milliseconds.
const RESPONSE_TIME_MIN_MS: f64 = 100.0;
const RESPONSE_TIME_MAX_MS: f64 = 5_000.0;

/// Above this latency, conversion and sales take a 10% penalty.
const LATENCY_PENALTY_MS: f64 = 1_000.0;

/// Server load is reported as a 0-100 percentage.
const SERVER_LOAD_MAX: f64 = 100.0;

/// Daily aggregates scale hourly counts by the business-hours span.
const ACTIVE_HOURS_PER_DAY: u32 = 16;

/// Weekly aggregates assume five business days.
const BUSINESS_DAYS_PER_WEEK: u32 = 5;

/// A generator behind the process-wide lock shared by the scheduler
/// and the HTTP handlers.
pub type SharedGenerator = Arc<Mutex<MetricsGenerator>>;

/// Locks a shared generator, recovering the guard if a previous
/// holder panicked.
pub fn lock_generator(generator: &SharedGenerator) -> MutexGuard<'_, MetricsGenerator> {
    generator.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stateful snapshot generator. One instance owns one metric stream.
#[derive(Debug)]
pub struct MetricsGenerator {
    params: GeneratorParams,
    rng: StdRng,
    base_time: DateTime<Utc>,
    archive: HistoricalArchive,
    last: Snapshot,
}

impl MetricsGenerator {
    /// Builds a generator seeded with an initial snapshot at `base_time`.
    ///
    /// The initial snapshot is the walk's starting point; it is not
    /// recorded in the historical archive.
    pub fn new(params: GeneratorParams, base_time: DateTime<Utc>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let last = initial_snapshot(&params, &mut rng, base_time);
        Self {
            params,
            rng,
            base_time,
            archive: HistoricalArchive::default(),
            last,
        }
    }

    /// Wraps the generator for shared use across tasks.
    pub fn into_shared(self) -> SharedGenerator {
        Arc::new(Mutex::new(self))
    }

    /// Advances the walk by one tick anchored at `reference_time` and
    /// returns the new snapshot.
    ///
    /// The snapshot is also written to the hourly archive bucket that
    /// contains `reference_time`, replacing any earlier entry for the
    /// same hour.
    pub fn generate_next(&mut self, reference_time: DateTime<Utc>) -> Snapshot {
        // Contextual factors for this instant.
        let time_factor = self.params.time_of_day_factor(reference_time.hour());
        let day_factor = self.params.day_of_week_factor(reference_time.weekday());
        #[allow(clippy::cast_precision_loss)]
        let days_since_base =
            reference_time.signed_duration_since(self.base_time).num_seconds() as f64 / 86_400.0;

        let user_trend = trend_factor(self.params.trends.active_users, days_since_base);
        let sales_trend = trend_factor(self.params.trends.sales, days_since_base);
        let conversion_trend = trend_factor(self.params.trends.conversion, days_since_base);
        let error_trend = trend_factor(self.params.trends.errors, days_since_base);

        let user_noise = 0.97 + 0.06 * self.rng.random::<f64>();
        let sales_noise = 0.95 + 0.10 * self.rng.random::<f64>();
        let conversion_noise = 0.98 + 0.04 * self.rng.random::<f64>();
        let anomaly = self.draw_anomaly_factor();

        // Headline volumes walk from the previous tick.
        let active_users = to_count(
            f64::from(self.last.active_users)
                * time_factor
                * day_factor
                * user_trend
                * user_noise
                * anomaly,
        )
        .max(MIN_ACTIVE_USERS);

        let mut conversion_rate = (self.last.conversion_rate * conversion_trend * conversion_noise)
            .clamp(CONVERSION_RATE_MIN, CONVERSION_RATE_MAX);

        let mut sales =
            to_count(f64::from(active_users) * conversion_rate / 100.0 * sales_trend * sales_noise);

        let requests_per_second = f64::from(active_users) * (0.03 + 0.02 * self.rng.random::<f64>());

        // Latency follows throughput on a log curve.
        let response_time_ms = (self.last.response_time_ms
            * (1.0 + 0.3 * (requests_per_second / 50.0 + 0.1).log10())
            * (0.95 + 0.10 * self.rng.random::<f64>()))
        .clamp(RESPONSE_TIME_MIN_MS, RESPONSE_TIME_MAX_MS);

        // Slow pages cost conversions.
        if response_time_ms > LATENCY_PENALTY_MS {
            conversion_rate =
                (conversion_rate * 0.9).clamp(CONVERSION_RATE_MIN, CONVERSION_RATE_MAX);
            sales = to_count(f64::from(sales) * 0.9);
        }

        let error_rate = (0.01 * (response_time_ms / 200.0) * error_trend).max(0.001) * 100.0;
        let total_errors = to_count(error_rate * requests_per_second / 100.0);
        let errors_by_type = self.distribute_errors(total_errors);

        let server_load = (30.0 + 50.0 * (requests_per_second / 200.0)
            + 10.0 * self.rng.random::<f64>())
        .min(SERVER_LOAD_MAX);
        let database_connections =
            to_count(20.0 + f64::from(active_users) / 40.0 + 30.0 * self.rng.random::<f64>());

        // Breakdowns jitter per bucket, then rescale to the exact totals.
        let (regional_data, sources_data) =
            self.distribute_breakdowns(active_users, sales, conversion_rate);
        let conversion_funnel = self.build_funnel(active_users, sales);

        self.archive.hourly.insert(
            buckets::hour_bucket(reference_time),
            ResolutionStats {
                active_users,
                sales,
                conversion_rate,
                response_time_ms,
            },
        );

        let snapshot = Snapshot {
            timestamp: reference_time.timestamp(),
            active_users,
            requests_per_second,
            response_time_ms,
            conversion_rate,
            sales,
            error_rate,
            errors_by_type,
            server_load,
            database_connections,
            regional_data,
            sources_data,
            conversion_funnel,
            historical_data: self.archive.clone(),
        };
        self.last = snapshot.clone();
        snapshot
    }

    /// Replays the walk hour by hour from the base time up to (but not
    /// including) `now`, filling the hourly, daily, and weekly archive.
    ///
    /// Daily entries are written at each midnight from that hour's
    /// snapshot, scaled to a business day; weekly entries likewise at
    /// each Monday midnight, scaled to a business week. Rates carry
    /// over unscaled.
    pub fn backfill_to(&mut self, now: DateTime<Utc>) {
        let mut cursor = self.base_time;
        while cursor < now {
            let snapshot = self.generate_next(cursor);
            if cursor.hour() == 0 {
                self.archive.daily.insert(
                    buckets::day_bucket(cursor),
                    ResolutionStats {
                        active_users: snapshot.active_users.saturating_mul(ACTIVE_HOURS_PER_DAY),
                        sales: snapshot.sales.saturating_mul(ACTIVE_HOURS_PER_DAY),
                        conversion_rate: snapshot.conversion_rate,
                        response_time_ms: snapshot.response_time_ms,
                    },
                );
                if cursor.weekday() == Weekday::Mon {
                    let weekly_scale = ACTIVE_HOURS_PER_DAY.saturating_mul(BUSINESS_DAYS_PER_WEEK);
                    self.archive.weekly.insert(
                        buckets::week_bucket(cursor),
                        ResolutionStats {
                            active_users: snapshot.active_users.saturating_mul(weekly_scale),
                            sales: snapshot.sales.saturating_mul(weekly_scale),
                            conversion_rate: snapshot.conversion_rate,
                            response_time_ms: snapshot.response_time_ms,
                        },
                    );
                }
            }
            let Some(next) = cursor.checked_add_signed(Duration::hours(1)) else {
                break;
            };
            cursor = next;
        }
        // The archive gained daily and weekly entries after the final
        // replayed tick cloned it; refresh the resting snapshot.
        self.last.historical_data = self.archive.clone();
    }

    /// The most recent snapshot, without advancing the walk.
    pub fn current_snapshot(&self) -> Snapshot {
        self.last.clone()
    }

    /// Time-ordered series for one metric at one resolution.
    pub fn historical_series(&self, resolution: Resolution, metric: MetricField) -> Vec<SeriesPoint> {
        resolution
            .series_of(&self.archive)
            .iter()
            .map(|(&timestamp, stats)| SeriesPoint {
                timestamp,
                value: metric.select(stats),
            })
            .collect()
    }

    /// Anomaly multiplier for this tick: usually 1.0, occasionally a
    /// spike in (1.0, 1.9) or its reciprocal dip.
    fn draw_anomaly_factor(&mut self) -> f64 {
        if self.rng.random::<f64>() >= self.params.anomaly_chance {
            return 1.0;
        }
        let spike = 1.0 + 0.9 * self.rng.random::<f64>();
        if self.rng.random_bool(0.5) {
            1.0 / spike
        } else {
            spike
        }
    }

    /// Splits `total_errors` across every configured category. Each
    /// non-final category draws 10-40% of the remaining pool; the final
    /// category absorbs the rest, so the counts always sum exactly.
    fn distribute_errors(&mut self, total_errors: u32) -> BTreeMap<String, u32> {
        let mut breakdown = BTreeMap::new();
        let mut remaining = total_errors;
        let last_index = self.params.error_categories.len().saturating_sub(1);
        for (index, category) in self.params.error_categories.iter().enumerate() {
            let count = if index == last_index {
                remaining
            } else {
                let share = 0.1 + 0.3 * self.rng.random::<f64>();
                to_count(f64::from(remaining) * share).min(remaining)
            };
            breakdown.insert(category.clone(), count);
            remaining = remaining.saturating_sub(count);
        }
        breakdown
    }

    /// Produces the regional and acquisition-source breakdowns for one
    /// tick. Weights are jittered per bucket and the resulting counts
    /// rescaled so users and sales sum exactly to the tick totals.
    fn distribute_breakdowns(
        &mut self,
        active_users: u32,
        sales: u32,
        conversion_rate: f64,
    ) -> (BTreeMap<String, RegionStats>, BTreeMap<String, u32>) {
        let region_count = self.params.region_weights.len();
        let mut region_names = Vec::with_capacity(region_count);
        let mut raw_users = Vec::with_capacity(region_count);
        let mut raw_sales = Vec::with_capacity(region_count);
        let mut region_conversions = Vec::with_capacity(region_count);
        for (region, weight) in &self.params.region_weights {
            let jittered = weight * (0.9 + 0.2 * self.rng.random::<f64>());
            let users = to_count(f64::from(active_users) * jittered);
            let conversion = conversion_rate * (0.9 + 0.2 * self.rng.random::<f64>());
            region_names.push(region.clone());
            raw_users.push(users);
            raw_sales.push(to_count(f64::from(users) * conversion / 100.0));
            region_conversions.push(conversion);
        }
        let scaled_users = rescale_to_total(&raw_users, active_users);
        let scaled_sales = rescale_to_total(&raw_sales, sales);
        let regional_data = region_names
            .into_iter()
            .zip(scaled_users)
            .zip(scaled_sales.into_iter().zip(region_conversions))
            .map(|((region, users), (region_sales, conversion))| {
                (
                    region,
                    RegionStats {
                        active_users: users,
                        sales: region_sales,
                        conversion_rate: conversion,
                    },
                )
            })
            .collect();

        let source_count = self.params.source_weights.len();
        let mut source_names = Vec::with_capacity(source_count);
        let mut raw_source_users = Vec::with_capacity(source_count);
        for (source, weight) in &self.params.source_weights {
            let jittered = weight * (0.85 + 0.3 * self.rng.random::<f64>());
            source_names.push(source.clone());
            raw_source_users.push(to_count(f64::from(active_users) * jittered));
        }
        let scaled_sources = rescale_to_total(&raw_source_users, active_users);
        let sources_data = source_names.into_iter().zip(scaled_sources).collect();

        (regional_data, sources_data)
    }

    /// Builds the conversion funnel for one tick. Stage ratios jitter,
    /// the final stage is pinned to `sales`, and any stage priced below
    /// its successor is lifted so the funnel never widens.
    fn build_funnel(&mut self, active_users: u32, sales: u32) -> ConversionFunnel {
        let visitors = active_users;
        let product_views =
            to_count(f64::from(visitors) * (0.65 + 0.10 * self.rng.random::<f64>()));
        let added_to_cart =
            to_count(f64::from(product_views) * (0.25 + 0.10 * self.rng.random::<f64>()));
        let began_checkout =
            to_count(f64::from(added_to_cart) * (0.45 + 0.10 * self.rng.random::<f64>()));

        let purchased_items = sales;
        let began_checkout = began_checkout.max(purchased_items);
        let added_to_cart = added_to_cart.max(began_checkout);
        let product_views = product_views.max(added_to_cart);
        let visitors = visitors.max(product_views);

        ConversionFunnel {
            visitors,
            product_views,
            added_to_cart,
            began_checkout,
            purchased_items,
        }
    }
}

/// The walk's starting snapshot: regional volumes from the weight
/// table, nominal health figures, an empty archive.
fn initial_snapshot(
    params: &GeneratorParams,
    rng: &mut StdRng,
    base_time: DateTime<Utc>,
) -> Snapshot {
    let mut regional_data = BTreeMap::new();
    let mut total_users: u32 = 0;
    for (region, weight) in &params.region_weights {
        let users = to_count(f64::from(params.base_active_users) * weight);
        let conversion = 2.5 + (rng.random::<f64>() - 0.5);
        let region_sales = to_count(f64::from(users) * conversion / 100.0);
        regional_data.insert(
            region.clone(),
            RegionStats {
                active_users: users,
                sales: region_sales,
                conversion_rate: conversion,
            },
        );
        total_users = total_users.saturating_add(users);
    }

    let sources_data = params
        .source_weights
        .iter()
        .map(|(source, weight)| (source.clone(), to_count(f64::from(total_users) * weight)))
        .collect();

    let visitors = total_users;
    let product_views = to_count(f64::from(visitors) * 0.7);
    let added_to_cart = to_count(f64::from(product_views) * 0.3);
    let began_checkout = to_count(f64::from(added_to_cart) * 0.5);
    let purchased_items = to_count(f64::from(began_checkout) * 0.8);

    Snapshot {
        timestamp: base_time.timestamp(),
        active_users: total_users,
        requests_per_second: f64::from(total_users) * 0.05,
        response_time_ms: 200.0,
        conversion_rate: 2.5,
        sales: purchased_items,
        error_rate: 1.0,
        errors_by_type: BTreeMap::new(),
        server_load: 40.0,
        database_connections: 50,
        regional_data,
        sources_data,
        conversion_funnel: ConversionFunnel {
            visitors,
            product_views,
            added_to_cart,
            began_checkout,
            purchased_items,
        },
        historical_data: HistoricalArchive::default(),
    }
}

/// Rescales raw bucket counts so they sum exactly to `target`.
///
/// Every bucket except the last takes the floor of its proportional
/// share; the last bucket absorbs whatever remains. Bucket order is
/// the caller's, so callers iterating a `BTreeMap` get a deterministic
/// assignment.
fn rescale_to_total(raw: &[u32], target: u32) -> Vec<u32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let current: u64 = raw.iter().map(|&value| u64::from(value)).sum();
    #[allow(clippy::cast_precision_loss)]
    let factor = if current == 0 {
        0.0
    } else {
        f64::from(target) / current as f64
    };
    let last_index = raw.len().saturating_sub(1);
    let mut scaled = Vec::with_capacity(raw.len());
    let mut remaining = target;
    for (index, &value) in raw.iter().enumerate() {
        let count = if index == last_index {
            remaining
        } else {
            to_count(f64::from(value) * factor).min(remaining)
        };
        scaled.push(count);
        remaining = remaining.saturating_sub(count);
    }
    scaled
}

/// Long-run drift multiplier after `days_since_base` days at a
/// per-30-day `rate`.
const fn trend_factor(rate: f64, days_since_base: f64) -> f64 {
    1.0 + rate * (days_since_base / 30.0)
}

/// Truncates a non-negative float to a count. Negative inputs and NaN
/// become zero; values beyond `u32::MAX` saturate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn to_count(value: f64) -> u32 {
    value as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    /// 2024-01-01 00:00 UTC, a Monday.
    fn monday_base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn hours_after(base: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
        base.checked_add_signed(Duration::hours(hours)).unwrap()
    }

    fn generator_with_seed(seed: u64) -> MetricsGenerator {
        MetricsGenerator::new(GeneratorParams::default(), monday_base(), seed)
    }

    #[test]
    fn initial_snapshot_has_expected_shape() {
        let generator = generator_with_seed(42);
        let snapshot = generator.current_snapshot();

        assert_eq!(snapshot.timestamp, monday_base().timestamp());
        assert_eq!(snapshot.regional_data.len(), 16);
        assert_eq!(snapshot.sources_data.len(), 8);
        assert!(snapshot.errors_by_type.is_empty());
        assert!(snapshot.historical_data.hourly.is_empty());

        assert!((snapshot.conversion_rate - 2.5).abs() < 1e-9);
        assert!((snapshot.response_time_ms - 200.0).abs() < 1e-9);
        assert!((snapshot.server_load - 40.0).abs() < 1e-9);
        assert_eq!(snapshot.database_connections, 50);

        // Regional users were summed into the total.
        let regional_total: u64 = snapshot
            .regional_data
            .values()
            .map(|region| u64::from(region.active_users))
            .sum();
        assert_eq!(regional_total, u64::from(snapshot.active_users));

        // Sales are anchored to the funnel's final stage.
        assert_eq!(snapshot.sales, snapshot.conversion_funnel.purchased_items);

        // Source counts are per-bucket floors, at most one user short each.
        let source_total: u64 = snapshot.sources_data.values().map(|&c| u64::from(c)).sum();
        assert!(source_total <= u64::from(snapshot.active_users));
        assert!(
            u64::from(snapshot.active_users).saturating_sub(source_total)
                <= snapshot.sources_data.len() as u64
        );
    }

    #[test]
    fn same_seed_same_walk() {
        let mut left = generator_with_seed(7);
        let mut right = generator_with_seed(7);
        for hour in 1..=24 {
            let at = hours_after(monday_base(), hour);
            assert_eq!(left.generate_next(at), right.generate_next(at));
        }
    }

    #[test]
    fn breakdowns_sum_exactly_to_totals() {
        let mut generator = generator_with_seed(42);
        for hour in 1..=60 {
            let snapshot = generator.generate_next(hours_after(monday_base(), hour));

            let regional_users: u64 = snapshot
                .regional_data
                .values()
                .map(|region| u64::from(region.active_users))
                .sum();
            assert_eq!(regional_users, u64::from(snapshot.active_users));

            let regional_sales: u64 = snapshot
                .regional_data
                .values()
                .map(|region| u64::from(region.sales))
                .sum();
            assert_eq!(regional_sales, u64::from(snapshot.sales));

            let source_users: u64 =
                snapshot.sources_data.values().map(|&c| u64::from(c)).sum();
            assert_eq!(source_users, u64::from(snapshot.active_users));
        }
    }

    #[test]
    fn error_counts_cover_every_category_and_sum_exactly() {
        let mut generator = generator_with_seed(42);
        for hour in 1..=60 {
            let snapshot = generator.generate_next(hours_after(monday_base(), hour));
            assert_eq!(snapshot.errors_by_type.len(), 5);
            for category in GeneratorParams::default().error_categories {
                assert!(snapshot.errors_by_type.contains_key(&category));
            }
            let total: u64 = snapshot.errors_by_type.values().map(|&c| u64::from(c)).sum();
            let expected =
                to_count(snapshot.error_rate * snapshot.requests_per_second / 100.0);
            assert_eq!(total, u64::from(expected));
        }
    }

    #[test]
    fn bounded_fields_stay_in_range() {
        let mut generator = generator_with_seed(3);
        for hour in 1..=200 {
            let snapshot = generator.generate_next(hours_after(monday_base(), hour));
            assert!(snapshot.active_users >= MIN_ACTIVE_USERS);
            assert!(snapshot.conversion_rate >= CONVERSION_RATE_MIN);
            assert!(snapshot.conversion_rate <= CONVERSION_RATE_MAX);
            assert!(snapshot.response_time_ms >= RESPONSE_TIME_MIN_MS);
            assert!(snapshot.response_time_ms <= RESPONSE_TIME_MAX_MS);
            assert!(snapshot.server_load >= 0.0);
            assert!(snapshot.server_load <= SERVER_LOAD_MAX);
            assert!(snapshot.requests_per_second >= 0.0);
            assert!(snapshot.error_rate >= 0.1 - 1e-9);
            assert!(snapshot.database_connections >= 20);
        }
    }

    #[test]
    fn funnel_narrows_and_ends_at_sales() {
        let mut generator = generator_with_seed(11);
        for hour in 1..=100 {
            let snapshot = generator.generate_next(hours_after(monday_base(), hour));
            let funnel = &snapshot.conversion_funnel;
            assert!(funnel.visitors >= funnel.product_views);
            assert!(funnel.product_views >= funnel.added_to_cart);
            assert!(funnel.added_to_cart >= funnel.began_checkout);
            assert!(funnel.began_checkout >= funnel.purchased_items);
            assert_eq!(funnel.purchased_items, snapshot.sales);
        }
    }

    #[test]
    fn anomaly_factor_stays_within_spike_bounds() {
        let mut generator = generator_with_seed(5);
        for _ in 0..10_000 {
            let factor = generator.draw_anomaly_factor();
            assert!(factor > 0.5);
            assert!(factor < 1.9);
        }
    }

    #[test]
    fn hourly_archive_is_aligned_and_embedded() {
        let mut generator = generator_with_seed(42);
        let mut last = None;
        for hour in 1..=48 {
            last = Some(generator.generate_next(hours_after(monday_base(), hour)));
        }
        let snapshot = last.unwrap();
        assert_eq!(snapshot.historical_data.hourly.len(), 48);
        for &key in snapshot.historical_data.hourly.keys() {
            assert_eq!(key % 3_600, 0);
        }
        // The final tick's own bucket is present.
        let final_key = buckets::hour_bucket(hours_after(monday_base(), 48));
        assert!(snapshot.historical_data.hourly.contains_key(&final_key));
    }

    #[test]
    fn repeated_ticks_in_one_hour_share_a_bucket() {
        let mut generator = generator_with_seed(42);
        let at = hours_after(monday_base(), 1);
        generator.generate_next(at);
        generator.generate_next(at.checked_add_signed(Duration::minutes(10)).unwrap());
        let snapshot = generator.current_snapshot();
        assert_eq!(snapshot.historical_data.hourly.len(), 1);
    }

    #[test]
    fn current_snapshot_does_not_advance_the_walk() {
        let mut generator = generator_with_seed(42);
        let produced = generator.generate_next(hours_after(monday_base(), 1));
        assert_eq!(generator.current_snapshot(), produced);
        assert_eq!(generator.current_snapshot(), produced);
    }

    #[test]
    fn backfill_fills_a_week_of_buckets() {
        let mut generator = generator_with_seed(42);
        let now = hours_after(monday_base(), 24 * 7);
        generator.backfill_to(now);

        let snapshot = generator.current_snapshot();
        let archive = &snapshot.historical_data;
        assert_eq!(archive.hourly.len(), 168);
        assert_eq!(archive.daily.len(), 7);
        assert_eq!(archive.weekly.len(), 1);

        for &key in archive.daily.keys() {
            assert_eq!(key % 86_400, 0);
        }
        assert!(archive.weekly.contains_key(&monday_base().timestamp()));
    }

    #[test]
    fn backfill_aggregates_scale_the_midnight_tick() {
        let mut generator = generator_with_seed(42);
        generator.backfill_to(hours_after(monday_base(), 24 * 7));
        let archive = &generator.current_snapshot().historical_data;

        for (key, daily) in &archive.daily {
            let hourly = archive.hourly.get(key).unwrap();
            assert_eq!(daily.active_users, hourly.active_users.saturating_mul(16));
            assert_eq!(daily.sales, hourly.sales.saturating_mul(16));
            assert!((daily.conversion_rate - hourly.conversion_rate).abs() < 1e-9);
            assert!((daily.response_time_ms - hourly.response_time_ms).abs() < 1e-9);
        }
        for (key, weekly) in &archive.weekly {
            let hourly = archive.hourly.get(key).unwrap();
            assert_eq!(weekly.active_users, hourly.active_users.saturating_mul(80));
            assert_eq!(weekly.sales, hourly.sales.saturating_mul(80));
        }
    }

    #[test]
    fn historical_series_is_strictly_ascending() {
        let mut generator = generator_with_seed(42);
        generator.backfill_to(hours_after(monday_base(), 24 * 7));

        let series = generator.historical_series(Resolution::Hourly, MetricField::ActiveUsers);
        assert_eq!(series.len(), 168);
        assert_eq!(series.first().unwrap().timestamp, monday_base().timestamp());
        let ascending = series
            .iter()
            .zip(series.iter().skip(1))
            .all(|(a, b)| a.timestamp < b.timestamp);
        assert!(ascending);

        let daily = generator.historical_series(Resolution::Daily, MetricField::ConversionRate);
        assert_eq!(daily.len(), 7);
    }

    #[test]
    fn rescale_preserves_exact_totals() {
        assert_eq!(rescale_to_total(&[10, 20, 30], 60), vec![10, 20, 30]);

        let scaled = rescale_to_total(&[1, 1, 1], 10);
        let total: u64 = scaled.iter().map(|&v| u64::from(v)).sum();
        assert_eq!(total, 10);
        assert_eq!(scaled, vec![3, 3, 4]);

        assert_eq!(rescale_to_total(&[5, 5], 0), vec![0, 0]);
        assert_eq!(rescale_to_total(&[0, 0, 0], 9), vec![0, 0, 9]);
        assert_eq!(rescale_to_total(&[], 9), Vec::<u32>::new());
    }

    #[test]
    fn to_count_truncates_and_saturates() {
        assert_eq!(to_count(3.9), 3);
        assert_eq!(to_count(0.0), 0);
        assert_eq!(to_count(-4.2), 0);
        assert_eq!(to_count(f64::NAN), 0);
        assert_eq!(to_count(1e12), u32::MAX);
    }
}
