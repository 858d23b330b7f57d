// ── Delivery snapshot store ──
//
// Lock-free snapshot storage plus the pure query and statistics
// functions that run against it.

mod query;
mod snapshot;
mod stats;

pub use query::{DeliveryQuery, SortOrder};
pub(crate) use snapshot::SnapshotStore;
pub use snapshot::Snapshot;
pub use stats::{DELIVERED_STATUSES, DeliveryStats, OVERDUE_STATUSES, STATUS_FIELD};
