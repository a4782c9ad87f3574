//! Shared application state for the metrics API server.
//!
//! [`AppState`] bundles the constructed-once service objects every
//! handler needs: the shared generator, the broadcast hub, the auth gate,
//! and the process-wide shutdown signal. It is wrapped in [`Arc`] and
//! injected via Axum's `State` extractor; there are no ambient globals.

use std::sync::Arc;
use std::time::Instant;

use pulse_core::generator::SharedGenerator;
use tokio::sync::watch;

use crate::auth::AuthGate;
use crate::hub::BroadcastHub;

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// The metrics generator, behind its process-wide lock.
    pub generator: SharedGenerator,
    /// Registry of connected viewers.
    pub hub: Arc<BroadcastHub>,
    /// Credential gate for protected routes.
    pub auth: AuthGate,
    /// Process-wide shutdown signal, observed by connection tasks.
    pub shutdown: watch::Receiver<bool>,
    started_at: Instant,
}

impl AppState {
    /// Assembles the state from its constructed-once services.
    pub fn new(
        generator: SharedGenerator,
        hub: Arc<BroadcastHub>,
        auth: AuthGate,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            generator,
            hub,
            auth,
            shutdown,
            started_at: Instant::now(),
        }
    }

    /// Whole seconds since this process's server state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
