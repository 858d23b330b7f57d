// ── Published delivery snapshot ──
//
// Lock-free single-writer / many-reader storage. A refresh builds a new
// `Snapshot` and swaps the pointer; readers hold whichever `Arc` they
// loaded for as long as they need it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parcelmon_api::DeliveryRecord;

/// An immutable, timestamped capture of every delivery record.
///
/// `refreshed_at` is `None` only for the placeholder that exists before
/// the first refresh; after that every snapshot carries a timestamp, even
/// when the upstream returned no records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<DeliveryRecord>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The placeholder published before the first refresh.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(records: Vec<DeliveryRecord>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            records,
            refreshed_at: Some(refreshed_at),
        }
    }

    pub fn records(&self) -> &[DeliveryRecord] {
        &self.records
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Whether a refresh has ever produced this snapshot.
    pub fn is_initialized(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Holder for the current [`Snapshot`].
pub(crate) struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// The current snapshot (single atomic load, never blocks).
    pub(crate) fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot. Readers holding the old one keep it.
    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;

    fn record(code: &str) -> DeliveryRecord {
        let mut fields = Map::new();
        fields.insert("code".into(), Value::String(code.into()));
        DeliveryRecord::new(fields)
    }

    #[test]
    fn store_starts_uninitialized() {
        let store = SnapshotStore::new();
        let snap = store.load();
        assert!(!snap.is_initialized());
        assert!(snap.is_empty());
    }

    #[test]
    fn empty_refresh_is_still_initialized() {
        let store = SnapshotStore::new();
        store.publish(Snapshot::new(Vec::new(), Utc::now()));
        let snap = store.load();
        assert!(snap.is_initialized());
        assert!(snap.is_empty());
    }

    #[test]
    fn readers_keep_the_snapshot_they_loaded() {
        let store = SnapshotStore::new();
        store.publish(Snapshot::new(vec![record("A1")], Utc::now()));
        let before = store.load();

        store.publish(Snapshot::new(vec![record("B2"), record("C3")], Utc::now()));
        let after = store.load();

        assert_eq!(before.len(), 1);
        assert_eq!(before.records()[0].field("code"), "A1");
        assert_eq!(after.len(), 2);
    }
}
