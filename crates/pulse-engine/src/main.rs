//! Pulse engine binary.
//!
//! This is the main entry point that wires together the metrics
//! generator, the startup backfill, the broadcast hub, the Redis relay,
//! the tick scheduler, and the HTTP/WebSocket server. It loads
//! configuration, initializes all subsystems, and runs until a shutdown
//! signal arrives.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `pulse-config.yaml` (or `PULSE_CONFIG`)
//! 3. Assign an instance identity for relay origin filtering
//! 4. Build the generator and backfill a week of history
//! 5. Create the broadcast hub
//! 6. Connect the Redis relay (standalone on failure)
//! 7. Start the HTTP/WebSocket server
//! 8. Start the relay forward loop and the tick scheduler
//! 9. Wait for SIGINT/SIGTERM, then shut everything down in order

mod sink;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pulse_core::config::{ConfigError, PulseConfig};
use pulse_core::generator::MetricsGenerator;
use pulse_core::params::GeneratorParams;
use pulse_core::scheduler::run_scheduler;
use pulse_relay::Relay;
use pulse_server::{start_server, AppState, AuthGate, BroadcastHub};
use pulse_types::InstanceId;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::sink::EngineSink;

/// Application entry point for the Pulse engine.
///
/// # Errors
///
/// Returns an error if configuration loading fails or a core task
/// panics; degraded dependencies (Redis) are never fatal.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("pulse-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        tick_interval_ms = config.generator.tick_interval_ms,
        backfill_days = config.generator.backfill_days,
        auth_enabled = config.auth.enabled,
        "Configuration loaded"
    );

    // 3. Instance identity for relay origin filtering.
    let instance = InstanceId::new();
    info!(%instance, "Instance identity assigned");

    // 4. Build the generator and backfill history.
    let now = Utc::now();
    let base_time = now
        .checked_sub_signed(chrono::Duration::days(i64::from(
            config.generator.backfill_days,
        )))
        .unwrap_or(now);
    let seed = config.generator.seed.unwrap_or_else(rand::random::<u64>);
    let mut generator = MetricsGenerator::new(GeneratorParams::default(), base_time, seed);
    generator.backfill_to(now);
    let archive = generator.current_snapshot().historical_data;
    info!(
        hourly = archive.hourly.len(),
        daily = archive.daily.len(),
        weekly = archive.weekly.len(),
        "Historical backfill complete"
    );
    let generator = generator.into_shared();

    // 5. Broadcast hub.
    let hub = Arc::new(BroadcastHub::new());

    // 6. Redis relay; a failure here means standalone mode, never an abort.
    let relay = match Relay::connect(&config.relay.url, &config.relay.channel, instance).await {
        Ok(relay) => Some(Arc::new(relay)),
        Err(e) => {
            warn!(error = %e, "Redis relay unavailable, running standalone");
            None
        }
    };

    // Process-wide shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 7. HTTP/WebSocket server.
    let auth = AuthGate::new(config.auth.enabled, &config.auth.jwt_secret);
    let state = Arc::new(AppState::new(
        Arc::clone(&generator),
        Arc::clone(&hub),
        auth,
        shutdown_rx.clone(),
    ));
    let server_handle = tokio::spawn({
        let server_config = config.server.clone();
        let state = Arc::clone(&state);
        async move {
            if let Err(e) = start_server(&server_config, state).await {
                error!(error = %e, "Metrics server exited with error");
            }
        }
    });

    // 8. Relay forward loop (peer snapshots into the local hub).
    if let Some(relay) = &relay {
        let relay = Arc::clone(relay);
        let forward_hub = Arc::clone(&hub);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            relay
                .run_forward_loop(move |snapshot| forward_hub.send_all(&snapshot), shutdown)
                .await;
        });
    }

    // Tick scheduler.
    let tick_interval = Duration::from_millis(config.generator.tick_interval_ms);
    let scheduler_handle = tokio::spawn({
        let generator = Arc::clone(&generator);
        let shutdown = shutdown_rx.clone();
        let mut tick_sink = EngineSink::new(Arc::clone(&hub), relay.clone());
        async move { run_scheduler(generator, &mut tick_sink, tick_interval, shutdown).await }
    });

    info!("pulse-engine running");

    // 9. Shutdown: stop the scheduler between ticks, close viewers,
    //    then let the server drain.
    wait_for_shutdown().await;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    let summary = scheduler_handle.await?;
    hub.close_all();
    let _ = server_handle.await;

    info!(
        total_ticks = summary.total_ticks,
        "pulse-engine shutdown complete"
    );
    Ok(())
}

/// Load the engine configuration.
///
/// Reads the file named by `PULSE_CONFIG` when set, otherwise
/// `pulse-config.yaml` in the working directory. A missing file yields
/// defaults with environment overrides applied.
fn load_config() -> Result<PulseConfig, ConfigError> {
    let path = std::env::var("PULSE_CONFIG")
        .map_or_else(|_| PathBuf::from("pulse-config.yaml"), PathBuf::from);
    if path.exists() {
        PulseConfig::from_file(&path)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = PulseConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Resolves when the process receives SIGINT (Ctrl-C) or SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
