//! DailyTransaction entity - an explicit ledger entry for one calendar day.
//!
//! Entries are mutable only while their date is the current day. That rule
//! is a business invariant, not a UI nicety, so it is modeled as an explicit
//! [`EditState`] capability that every mutation path consults before
//! accepting an edit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Edit capability of a ledger entry, derived purely from `date == today`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    /// The entry belongs to the current day and may be changed or deleted
    Editable,
    /// The entry belongs to another day; any edit attempt must be rejected
    Locked,
}

/// Explicit daily ledger entry as served by the remote data service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTransaction {
    /// Unique identifier
    pub id: i64,
    /// Owning plan item
    pub plan_item_id: i64,
    /// Category for standalone budget tracking, when assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Calendar day the entry belongs to
    pub date: NaiveDate,
    /// Human-readable label
    pub label: String,
    /// Amount in the plan currency
    pub amount: f64,
}

impl DailyTransaction {
    /// Capability check for the mutation path.
    #[must_use]
    pub fn edit_state(&self, today: NaiveDate) -> EditState {
        if self.date == today {
            EditState::Editable
        } else {
            EditState::Locked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, txn};

    #[test]
    fn test_today_is_editable() {
        let entry = txn(1, 5, date(2026, 3, 14), 12.0);
        assert_eq!(entry.edit_state(date(2026, 3, 14)), EditState::Editable);
    }

    #[test]
    fn test_other_days_are_locked() {
        let entry = txn(1, 5, date(2026, 3, 13), 12.0);
        assert_eq!(entry.edit_state(date(2026, 3, 14)), EditState::Locked);
        // A future-dated entry is just as locked as a past one
        let entry = txn(2, 5, date(2026, 3, 15), 12.0);
        assert_eq!(entry.edit_state(date(2026, 3, 14)), EditState::Locked);
    }
}
