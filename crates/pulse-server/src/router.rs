//! Axum router construction for the metrics API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access. The
//! route table is identical whether auth is enabled or not; only the
//! gating inside the handlers differs.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the metrics server.
///
/// The router includes:
/// - `GET /health` -- static ok status
/// - `GET /ws` -- `WebSocket` snapshot stream
/// - `GET /metrics/current` -- latest snapshot
/// - `GET /metrics/historical/{period}/{metric}` -- archive series
/// - `GET /admin/status` -- viewer count + uptime (admin role)
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws", get(ws::ws_stream))
        // REST API
        .route("/metrics/current", get(handlers::current_snapshot))
        .route(
            "/metrics/historical/{period}/{metric}",
            get(handlers::historical_series),
        )
        .route("/admin/status", get(handlers::admin_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
