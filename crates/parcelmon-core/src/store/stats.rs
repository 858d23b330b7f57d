// ── Delivery summary statistics ──
//
// Status buckets are matched on the lower-cased `statusText` field.
// `delivered` and `overdue` are counted independently: a record can be
// both pending and overdue.

use parcelmon_api::DeliveryRecord;
use serde::Serialize;

/// Field holding the human-readable delivery status.
pub const STATUS_FIELD: &str = "statusText";

/// Lower-cased status texts that count as delivered.
pub const DELIVERED_STATUSES: &[&str] = &["zugestellt", "delivered", "completed"];

/// Lower-cased status texts that count as overdue.
pub const OVERDUE_STATUSES: &[&str] = &["spät", "late", "overdue", "verzögert"];

/// Aggregate counts over a full snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub total: usize,
    pub delivered: usize,
    /// `total - delivered`.
    pub pending: usize,
    pub overdue: usize,
}

impl DeliveryStats {
    pub fn from_records(records: &[DeliveryRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            let status = record.field(STATUS_FIELD).to_lowercase();
            if DELIVERED_STATUSES.contains(&status.as_str()) {
                stats.delivered += 1;
            }
            if OVERDUE_STATUSES.contains(&status.as_str()) {
                stats.overdue += 1;
            }
        }

        stats.pending = stats.total - stats.delivered;
        stats
    }
}
