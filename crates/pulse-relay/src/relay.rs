//! Redis pub/sub bridge between instances.
//!
//! Each instance publishes its locally generated snapshots to one shared
//! channel and holds a standing subscription to the same channel. Inbound
//! envelopes from peers are forwarded to the local broadcast hub; the
//! instance's own publications come back on the subscription too and are
//! dropped by origin id, so local viewers never see a tick twice.
//!
//! The whole pipeline is best-effort. A publish that fails is logged and
//! forgotten; a subscription that dies leaves the instance in standalone
//! mode. Nothing here may block or fail snapshot generation.

use fred::clients::SubscriberClient;
use fred::prelude::*;
use pulse_types::{Envelope, InstanceId, Snapshot};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::RelayError;

/// Cross-instance relay over one shared Redis pub/sub channel.
pub struct Relay {
    publisher: Client,
    subscriber: SubscriberClient,
    channel: String,
    origin: InstanceId,
}

impl Relay {
    /// Connect both the publish and subscribe halves to Redis at `url`
    /// and subscribe to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if the URL cannot be parsed, or
    /// [`RelayError::Redis`] if either connection or the subscription
    /// fails. Callers treat any error as "run standalone".
    pub async fn connect(
        url: &str,
        channel: &str,
        origin: InstanceId,
    ) -> Result<Self, RelayError> {
        let config = Config::from_url(url)
            .map_err(|e| RelayError::Config(format!("invalid Redis URL: {e}")))?;

        let publisher = Builder::from_config(config.clone()).build()?;
        publisher.init().await?;

        let subscriber = Builder::from_config(config).build_subscriber_client()?;
        subscriber.init().await?;
        subscriber.subscribe(channel).await?;

        info!(channel, %origin, "Relay connected to Redis");
        Ok(Self {
            publisher,
            subscriber,
            channel: channel.to_owned(),
            origin,
        })
    }

    /// The instance id this relay stamps on outbound envelopes.
    pub const fn origin(&self) -> InstanceId {
        self.origin
    }

    /// Publish a locally generated snapshot to the shared channel.
    ///
    /// Fire-and-forget: serialization or publish failures are logged and
    /// otherwise ignored, so a broken channel never stalls a tick.
    pub async fn publish(&self, snapshot: Snapshot) {
        let envelope = Envelope {
            origin: self.origin,
            snapshot,
        };
        let payload = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize relay envelope, dropping");
                return;
            }
        };
        let result: Result<u32, Error> = self
            .publisher
            .publish(self.channel.as_str(), payload.as_str())
            .await;
        match result {
            Ok(receivers) => {
                debug!(receivers, "Published snapshot to relay channel");
            }
            Err(e) => {
                warn!(error = %e, "Relay publish failed, continuing standalone");
            }
        }
    }

    /// Forward inbound peer snapshots to `deliver` until the channel dies
    /// or `shutdown` flips.
    ///
    /// Self-originated messages are dropped; malformed payloads are logged
    /// and skipped. When the subscription closes the loop ends quietly and
    /// the instance continues standalone.
    pub async fn run_forward_loop(
        &self,
        mut deliver: impl FnMut(Snapshot) + Send,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut rx = self.subscriber.message_rx();
        info!(channel = self.channel, "Relay forward loop started");

        loop {
            tokio::select! {
                message = rx.recv() => {
                    match message {
                        Ok(message) => {
                            let Some(payload) = message.value.as_bytes() else {
                                warn!("Relay message carried a non-bytes payload, skipping");
                                continue;
                            };
                            dispatch_payload(payload, self.origin, &mut deliver);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            debug!(skipped = n, "Relay subscriber lagged, skipping ahead");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            warn!("Relay subscription closed, continuing standalone");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("Shutdown observed, stopping relay forward loop");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("channel", &self.channel)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Decode one inbound payload and route it.
///
/// Self-originated envelopes are dropped, peer snapshots go to `deliver`,
/// malformed payloads are logged and skipped.
fn dispatch_payload(payload: &[u8], local: InstanceId, deliver: &mut impl FnMut(Snapshot)) {
    match decode_envelope(payload) {
        Ok(envelope) if envelope.origin == local => {
            // Our own publication echoed back.
            debug!("Dropped self-originated relay message");
        }
        Ok(envelope) => {
            debug!(
                origin = %envelope.origin,
                timestamp = envelope.snapshot.timestamp,
                "Forwarding peer snapshot to local viewers"
            );
            deliver(envelope.snapshot);
        }
        Err(e) => {
            warn!(error = %e, "Malformed relay payload, skipping");
        }
    }
}

/// Deserialize one relay payload into an [`Envelope`].
///
/// # Errors
///
/// Returns [`RelayError::Serialization`] if the payload is not a valid
/// envelope.
pub fn decode_envelope(payload: &[u8]) -> Result<Envelope, RelayError> {
    Ok(serde_json::from_slice(payload)?)
}
