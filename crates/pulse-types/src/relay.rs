//! Cross-instance relay wire types.
//!
//! Every instance publishes its locally generated snapshots to the shared
//! channel wrapped in an [`Envelope`]; the origin id lets subscribers drop
//! their own publications instead of re-delivering them locally.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Identifies one running server instance for the lifetime of its process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for InstanceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<InstanceId> for Uuid {
    fn from(id: InstanceId) -> Self {
        id.0
    }
}

/// One relayed snapshot plus the instance that generated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Envelope {
    /// Instance that generated and published the snapshot.
    pub origin: InstanceId,
    /// The snapshot exactly as broadcast to that instance's own viewers.
    pub snapshot: Snapshot,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique_and_displayable() {
        let a = InstanceId::new();
        let b = InstanceId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.into_inner().to_string());
    }

    #[test]
    fn envelope_preserves_origin_through_json() {
        let origin = InstanceId::new();
        let envelope = Envelope {
            origin,
            snapshot: crate::test_support::tiny_snapshot(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.origin, origin);
        assert_eq!(decoded.snapshot, envelope.snapshot);
    }
}
