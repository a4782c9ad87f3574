//! Bridges the scheduler's tick output to local viewers and the relay.

use std::sync::Arc;

use pulse_core::scheduler::TickSink;
use pulse_relay::Relay;
use pulse_server::BroadcastHub;
use pulse_types::Snapshot;

/// Delivers each generated snapshot to the broadcast hub and, when the
/// relay is connected, publishes it to the shared channel.
pub struct EngineSink {
    hub: Arc<BroadcastHub>,
    relay: Option<Arc<Relay>>,
}

impl EngineSink {
    /// Builds a sink over the hub and an optional relay.
    pub const fn new(hub: Arc<BroadcastHub>, relay: Option<Arc<Relay>>) -> Self {
        Self { hub, relay }
    }
}

impl TickSink for EngineSink {
    fn deliver(&mut self, snapshot: Snapshot) {
        // Local viewers first; the relay must never delay local delivery.
        self.hub.send_all(&snapshot);
        if let Some(relay) = &self.relay {
            let relay = Arc::clone(relay);
            tokio::spawn(async move {
                relay.publish(snapshot).await;
            });
        }
    }
}
