//! Delivery cache between `parcelmon-api` and the HTTP read surface.
//!
//! This crate owns the refresh loop and the in-memory read model:
//!
//! - **[`DeliveryMonitor`]** - Central facade. [`start()`](DeliveryMonitor::start)
//!   loads the first snapshot, then spawns a background task that refreshes
//!   it on a fixed period. [`refresh()`](DeliveryMonitor::refresh) can also
//!   be triggered on demand; at most one refresh runs at a time.
//!
//! - **[`Snapshot`]** - Immutable, timestamped list of delivery records,
//!   published through an atomic pointer swap. Readers never block on a
//!   refresh in progress; they see the previous snapshot until the new one
//!   is published.
//!
//! - **[`DeliveryQuery`]** / **[`DeliveryStats`]** - Case-insensitive
//!   substring filtering, stable sorting, and status summaries computed
//!   from the current snapshot without touching the network.

pub mod config;
pub mod error;
pub mod monitor;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_UPDATE_INTERVAL, MonitorConfig};
pub use error::CoreError;
pub use monitor::{DeliveryMonitor, MonitorState};
pub use store::{DeliveryQuery, DeliveryStats, Snapshot, SortOrder};

// Re-export the upstream types consumers need without a direct dependency.
pub use parcelmon_api::{Credentials, DeliveryRecord};
