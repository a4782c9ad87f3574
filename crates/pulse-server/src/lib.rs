//! Metrics API server for the Pulse streaming service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) streaming one snapshot per tick to
//!   every connected viewer via the [`BroadcastHub`]
//! - **REST endpoints** for the latest snapshot, the multi-resolution
//!   historical series, and a role-gated admin status
//! - **Auth gate** verifying HS256 bearer tokens on gated routes
//!
//! # Architecture
//!
//! Handlers read from the shared generator under its lock; the broadcast
//! hub keeps its own lock over the viewer registry and never blocks on
//! network I/O while holding it. Every snapshot broadcast is serialized
//! once and shared across all viewers.
//!
//! [`BroadcastHub`]: hub::BroadcastHub

pub mod auth;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use auth::{AuthError, AuthGate};
pub use error::ApiError;
pub use hub::BroadcastHub;
pub use router::build_router;
pub use server::{start_server, ServerError};
pub use state::AppState;
