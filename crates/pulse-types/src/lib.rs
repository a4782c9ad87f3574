//! Shared type definitions for the Pulse metrics streaming service.
//!
//! This crate is the single source of truth for every type that crosses a
//! process boundary: the snapshot a viewer receives each tick, the
//! historical-series payloads, the relay envelope exchanged between
//! instances, and the identity record the auth gate produces. Types defined
//! here flow downstream to `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`snapshot`] -- The metrics snapshot and its historical archive
//! - [`series`] -- Resolution/metric selection and series points
//! - [`identity`] -- Fixed-shape authenticated-caller record
//! - [`relay`] -- Cross-instance envelope and instance identity

pub mod identity;
pub mod relay;
pub mod series;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use identity::Identity;
pub use relay::{Envelope, InstanceId};
pub use series::{MetricField, Resolution, SeriesPoint, SeriesValue};
pub use snapshot::{
    ConversionFunnel, HistoricalArchive, RegionStats, ResolutionStats, Snapshot,
};

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal fixtures shared by this crate's unit tests.

    use std::collections::BTreeMap;

    use crate::snapshot::{ConversionFunnel, HistoricalArchive, Snapshot};

    /// A structurally complete snapshot with mostly empty breakdowns.
    pub(crate) fn tiny_snapshot() -> Snapshot {
        Snapshot {
            timestamp: 60,
            active_users: 10,
            requests_per_second: 0.5,
            response_time_ms: 200.0,
            conversion_rate: 2.5,
            sales: 0,
            error_rate: 1.0,
            errors_by_type: BTreeMap::new(),
            server_load: 40.0,
            database_connections: 50,
            regional_data: BTreeMap::new(),
            sources_data: BTreeMap::new(),
            conversion_funnel: ConversionFunnel {
                visitors: 10,
                product_views: 7,
                added_to_cart: 2,
                began_checkout: 1,
                purchased_items: 0,
            },
            historical_data: HistoricalArchive::default(),
        }
    }
}
