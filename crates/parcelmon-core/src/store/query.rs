// ── Delivery query: field filters and sorting ──
//
// Pure functions over a record slice. Filters are case-insensitive
// substring matches on the string form of a field; sorting is stable in
// both directions.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use parcelmon_api::DeliveryRecord;

/// Sort direction. Anything other than `"desc"` (any case) is ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Filter and sort parameters for [`DeliveryMonitor::query`].
///
/// [`DeliveryMonitor::query`]: crate::DeliveryMonitor::query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryQuery {
    /// Field name -> substring. Empty values are ignored.
    pub filters: BTreeMap<String, String>,
    /// Field to sort by. `None` (or an empty name) keeps upstream order.
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl DeliveryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a substring filter on `field`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = order;
        self
    }

    /// Apply this query to `records`, returning the matching records in
    /// result order.
    pub fn apply(&self, records: &[DeliveryRecord]) -> Vec<DeliveryRecord> {
        let needles: Vec<(&str, String)> = self
            .filters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| (field.as_str(), value.to_lowercase()))
            .collect();

        let mut matched: Vec<DeliveryRecord> = records
            .iter()
            .filter(|record| {
                needles
                    .iter()
                    .all(|(field, needle)| record.field(field).to_lowercase().contains(needle))
            })
            .cloned()
            .collect();

        if let Some(field) = self.sort_by.as_deref().filter(|f| !f.is_empty()) {
            // `sort_by_cached_key` is stable, so ties keep upstream order
            // in both directions.
            match self.sort_order {
                SortOrder::Asc => matched.sort_by_cached_key(|r| r.field(field).into_owned()),
                SortOrder::Desc => {
                    matched.sort_by_cached_key(|r| Reverse(r.field(field).into_owned()));
                }
            }
        }

        matched
    }
}
