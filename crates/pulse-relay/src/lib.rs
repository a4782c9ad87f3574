//! Cross-instance snapshot relay for the Pulse metrics service.
//!
//! A fleet of Pulse instances presents one logical stream: every instance
//! publishes its locally generated snapshots to a shared Redis pub/sub
//! channel and forwards every peer's snapshots to its own viewers. The
//! relay is strictly best-effort; when Redis is missing or dies, the
//! instance keeps serving its local stream.
//!
//! # Modules
//!
//! - [`error`] -- The [`RelayError`] type.
//! - [`relay`] -- The [`Relay`]: connect, publish, and the inbound
//!   forward loop.

pub mod error;
pub mod relay;

pub use error::RelayError;
pub use relay::{decode_envelope, Relay};
