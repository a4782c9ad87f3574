//! Model parameters for the coherent metrics generator.
//!
//! Everything the generator treats as a tunable lives here:
//!
//! - Base volumes and the business-hours window
//! - Day-of-week and long-run trend multipliers
//! - Regional and acquisition-source weight tables
//! - Anomaly odds and the error-category list
//!
//! The defaults describe a mid-size e-commerce property and are the
//! values used by the engine unless a config file overrides the seed
//! or cadence. The weight tables are intentionally not normalized;
//! the generator rescales per-bucket counts back to the tick totals.

use std::collections::BTreeMap;

use chrono::Weekday;

/// Multiplier applied outside the configured business-hours window.
const OFF_HOURS_FACTOR: f64 = 0.5;

/// Long-run drift rates, expressed as fractional growth per 30 days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendRates {
    /// Monthly growth applied to active users.
    pub active_users: f64,
    /// Monthly growth applied to sales volume.
    pub sales: f64,
    /// Monthly growth applied to the conversion rate.
    pub conversion: f64,
    /// Monthly drift applied to the error rate. Negative means the
    /// platform gets healthier over time.
    pub errors: f64,
}

impl Default for TrendRates {
    fn default() -> Self {
        Self {
            active_users: 0.15,
            sales: 0.12,
            conversion: 0.02,
            errors: -0.05,
        }
    }
}

/// Per-weekday traffic multipliers. Friday peaks, the weekend dips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayOfWeekFactors {
    /// Monday multiplier.
    pub monday: f64,
    /// Tuesday multiplier.
    pub tuesday: f64,
    /// Wednesday multiplier.
    pub wednesday: f64,
    /// Thursday multiplier.
    pub thursday: f64,
    /// Friday multiplier.
    pub friday: f64,
    /// Saturday multiplier.
    pub saturday: f64,
    /// Sunday multiplier.
    pub sunday: f64,
}

impl Default for DayOfWeekFactors {
    fn default() -> Self {
        Self {
            monday: 0.85,
            tuesday: 0.9,
            wednesday: 1.0,
            thursday: 1.05,
            friday: 1.2,
            saturday: 0.7,
            sunday: 0.6,
        }
    }
}

impl DayOfWeekFactors {
    /// Multiplier for the given weekday.
    pub const fn factor(&self, weekday: Weekday) -> f64 {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

/// Full parameter set for one generator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    /// Nominal concurrent-user volume the initial snapshot is seeded from.
    pub base_active_users: u32,
    /// Nominal hourly sales volume. Kept as a reference anchor for
    /// dashboards; the tick algorithm derives sales from users and the
    /// conversion rate instead.
    pub base_sales: u32,
    /// First hour (inclusive, 0-23) of the business-hours window.
    pub day_start_hour: u32,
    /// Last hour (inclusive, 0-23) of the business-hours window.
    pub day_end_hour: u32,
    /// Depth of the intraday activity curve. At 0.7 the window edges
    /// sit at 30% of the midday peak.
    pub seasonality_amplitude: f64,
    /// Probability per tick of drawing an anomaly multiplier.
    pub anomaly_chance: f64,
    /// Long-run drift rates.
    pub trends: TrendRates,
    /// Per-weekday traffic multipliers.
    pub day_of_week_factors: DayOfWeekFactors,
    /// Share of active users attributed to each region.
    pub region_weights: BTreeMap<String, f64>,
    /// Share of active users attributed to each acquisition source.
    pub source_weights: BTreeMap<String, f64>,
    /// Error categories every tick reports, even at zero count.
    pub error_categories: Vec<String>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            base_active_users: 1200,
            base_sales: 120,
            day_start_hour: 8,
            day_end_hour: 20,
            seasonality_amplitude: 0.7,
            anomaly_chance: 0.03,
            trends: TrendRates::default(),
            day_of_week_factors: DayOfWeekFactors::default(),
            region_weights: default_region_weights(),
            source_weights: default_source_weights(),
            error_categories: default_error_categories(),
        }
    }
}

impl GeneratorParams {
    /// Intraday activity multiplier for the given hour (0-23).
    ///
    /// Outside the business-hours window the factor is a flat
    /// [`OFF_HOURS_FACTOR`]. Inside it the factor falls off linearly
    /// from 1.0 at the window midpoint to `1.0 - seasonality_amplitude`
    /// at the window edges.
    pub fn time_of_day_factor(&self, hour: u32) -> f64 {
        if self.day_end_hour <= self.day_start_hour {
            return OFF_HOURS_FACTOR;
        }
        if hour < self.day_start_hour || hour > self.day_end_hour {
            return OFF_HOURS_FACTOR;
        }
        let midpoint = (f64::from(self.day_start_hour) + f64::from(self.day_end_hour)) / 2.0;
        let half_window = (f64::from(self.day_end_hour) - f64::from(self.day_start_hour)) / 2.0;
        let distance = (f64::from(hour) - midpoint).abs();
        1.0 - self.seasonality_amplitude * (distance / half_window)
    }

    /// Traffic multiplier for the given weekday.
    pub const fn day_of_week_factor(&self, weekday: Weekday) -> f64 {
        self.day_of_week_factors.factor(weekday)
    }
}

// ---------------------------------------------------------------------------
// Default tables
// ---------------------------------------------------------------------------

fn default_region_weights() -> BTreeMap<String, f64> {
    [
        ("New York", 0.26),
        ("Los Angeles", 0.18),
        ("Chicago", 0.06),
        ("Houston", 0.05),
        ("Phoenix", 0.045),
        ("Philadelphia", 0.040),
        ("San Antonio", 0.035),
        ("San Diego", 0.03),
        ("Dallas", 0.035),
        ("Austin", 0.035),
        ("San Jose", 0.03),
        ("Seattle", 0.025),
        ("Denver", 0.02),
        ("Boston", 0.025),
        ("Portland", 0.02),
        ("Miami", 0.03),
    ]
    .into_iter()
    .map(|(region, weight)| (region.to_owned(), weight))
    .collect()
}

fn default_source_weights() -> BTreeMap<String, f64> {
    [
        ("Organic Search", 0.35),
        ("Direct", 0.15),
        ("Social Media", 0.20),
        ("Email", 0.10),
        ("Referral", 0.05),
        ("Paid Search", 0.08),
        ("Display Ads", 0.04),
        ("Affiliates", 0.03),
    ]
    .into_iter()
    .map(|(source, weight)| (source.to_owned(), weight))
    .collect()
}

fn default_error_categories() -> Vec<String> {
    [
        "Server Error",
        "Client Error",
        "Network Error",
        "Database Error",
        "Validation Error",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
