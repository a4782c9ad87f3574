//! Fixed-cadence tick scheduler.
//!
//! Drives a shared [`MetricsGenerator`] at a fixed interval and hands
//! each snapshot to a [`TickSink`]. The scheduler owns nothing about
//! delivery; fan-out to viewers and the relay live behind the sink.

use std::time::Duration;

use chrono::Utc;
use pulse_types::Snapshot;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::generator::{lock_generator, SharedGenerator};

/// Receives each generated snapshot, once per tick.
pub trait TickSink: Send {
    /// Called with the snapshot produced for the current tick.
    fn deliver(&mut self, snapshot: Snapshot);
}

/// Sink that discards snapshots. Useful for tests and warm-up runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl TickSink for NoOpSink {
    fn deliver(&mut self, _snapshot: Snapshot) {}
}

/// Final accounting returned when the scheduler stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Ticks generated and delivered before shutdown.
    pub total_ticks: u64,
}

/// Runs the tick loop until the shutdown signal changes.
///
/// Each tick locks the generator, advances the walk anchored at the
/// current wall-clock time, and delivers the snapshot to `sink`. A
/// shutdown observed between ticks stops the loop; a tick already in
/// progress always completes. Missed ticks are delayed, not bunched.
pub async fn run_scheduler(
    generator: SharedGenerator,
    sink: &mut dyn TickSink,
    tick_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> SchedulerSummary {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(?tick_interval, "Metrics scheduler starting");

    let mut total_ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = lock_generator(&generator).generate_next(Utc::now());
                debug!(
                    tick = total_ticks,
                    active_users = snapshot.active_users,
                    "Generated snapshot"
                );
                sink.deliver(snapshot);
                total_ticks = total_ticks.saturating_add(1);
            }
            _ = shutdown.changed() => {
                info!(total_ticks, "Shutdown observed, stopping metrics scheduler");
                break;
            }
        }
    }

    SchedulerSummary { total_ticks }
}
