//! Snapshot fan-out to connected viewers.
//!
//! [`BroadcastHub`] owns the set of live viewer sinks. Each sink is the
//! sending half of a small bounded channel of pre-serialized frames; the
//! `WebSocket` task on the other end forwards frames to the socket. A
//! broadcast serializes the snapshot once and hands the same shared frame
//! to every sink.
//!
//! A sink whose write fails -- channel closed (task gone) or full (viewer
//! not draining) -- is removed on the spot, so one dead viewer can never
//! poison future broadcasts. The registry lock is held only for the
//! add/remove/fan-out iteration itself, never across network I/O, and is
//! disjoint from the generator's lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pulse_types::Snapshot;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-viewer frame buffer. A viewer this far behind is not draining its
/// socket and counts as dead.
const FRAME_BUFFER: usize = 32;

/// A pre-serialized snapshot frame, shared across all sinks of one broadcast.
pub type Frame = Arc<str>;

/// Registry of connected viewers and the fan-out over them.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    sinks: Mutex<HashMap<Uuid, mpsc::Sender<Frame>>>,
}

impl BroadcastHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new viewer, returning its id and the receiving half of
    /// its frame channel.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let id = Uuid::now_v7();
        self.lock().insert(id, tx);
        debug!(viewer = %id, "Viewer registered");
        (id, rx)
    }

    /// Removes a viewer. A no-op when the viewer is already gone.
    pub fn unregister(&self, id: Uuid) {
        if self.lock().remove(&id).is_some() {
            debug!(viewer = %id, "Viewer unregistered");
        }
    }

    /// Serializes `snapshot` once and delivers the frame to every
    /// registered viewer.
    ///
    /// Viewers whose channel is closed or full are dropped from the
    /// registry immediately; delivery continues to the rest. A
    /// serialization failure skips this broadcast entirely (the next tick
    /// tries again).
    pub fn send_all(&self, snapshot: &Snapshot) {
        let frame: Frame = match serde_json::to_string(snapshot) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot, skipping broadcast");
                return;
            }
        };

        let mut sinks = self.lock();
        let before = sinks.len();
        sinks.retain(|id, tx| match tx.try_send(Arc::clone(&frame)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(viewer = %id, "Viewer not draining frames, removing");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(viewer = %id, "Viewer channel closed, removing");
                false
            }
        });
        debug!(
            delivered = sinks.len(),
            removed = before.saturating_sub(sinks.len()),
            "Broadcast snapshot"
        );
    }

    /// Number of currently registered viewers.
    pub fn viewer_count(&self) -> usize {
        self.lock().len()
    }

    /// Drops every sink, closing all viewer channels. Used at shutdown.
    pub fn close_all(&self) {
        let mut sinks = self.lock();
        let closed = sinks.len();
        sinks.clear();
        if closed > 0 {
            debug!(closed, "Closed all viewer sinks");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, mpsc::Sender<Frame>>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
