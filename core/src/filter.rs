//! Thin query/filter layer applied strictly before normalization.
//!
//! Filtering is a pure subset operation: it never fabricates or mutates
//! field values, it only narrows the working record set by darkstore,
//! trader, and date window.

use crate::record::VisitRecord;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Keep only visits at these darkstore labels. `None` keeps all.
    pub darkstores: Option<Vec<String>>,
    /// Keep only visits by these trader ids. `None` keeps all.
    pub traders: Option<Vec<String>>,
    /// Inclusive date window on the visit timestamp.
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl RecordFilter {
    pub fn apply(&self, records: &[VisitRecord]) -> Vec<VisitRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }

    fn matches(&self, record: &VisitRecord) -> bool {
        if let Some(stores) = &self.darkstores {
            if !stores.iter().any(|s| s == &record.darkstore) {
                return false;
            }
        }
        if let Some(traders) = &self.traders {
            if !traders.iter().any(|t| t == &record.trader_id) {
                return false;
            }
        }
        if let Some((from, to)) = &self.date_range {
            if record.visit_date < *from || record.visit_date > *to {
                return false;
            }
        }
        true
    }
}
