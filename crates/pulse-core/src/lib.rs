//! Metrics generation, scheduling, and configuration for the Pulse engine.
//!
//! This crate owns the simulated metric stream that drives the dashboard:
//! a seeded random walk produces one coherent snapshot per tick, a
//! backfill pass replays a week of history at startup, and a scheduler
//! delivers live ticks to whatever sink the engine wires in.
//!
//! # Modules
//!
//! - [`buckets`] -- Time-bucket alignment for archive keys (hour, day,
//!   ISO week).
//! - [`config`] -- Configuration loading from `pulse-config.yaml` into
//!   strongly-typed structs, with environment overrides.
//! - [`generator`] -- The coherent snapshot generator, historical
//!   backfill, and series queries.
//! - [`params`] -- Model parameters: weight tables, trends, and the
//!   intraday activity curve.
//! - [`scheduler`] -- Fixed-cadence tick loop behind the [`TickSink`]
//!   seam.
//!
//! [`TickSink`]: scheduler::TickSink

pub mod buckets;
pub mod config;
pub mod generator;
pub mod params;
pub mod scheduler;
