//! PlanItem entity - a single budgeted income or expense line.
//!
//! The `exclude_kind` controls how the daily ledger is reconciled: FIXED
//! expense lines never receive synthesized default transactions, FLEXIBLE
//! ones do whenever a day has no explicit entries.

use serde::{Deserialize, Serialize};

/// Direction of a budget line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    /// Money coming in; never receives default-transaction fallback
    Income,
    /// Money going out; tracked against the daily ledger
    Expense,
}

/// How an expense line participates in automatic adjustments and defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExcludeKind {
    /// Fixed charge; no default fallback, no auto-adjustment
    Fixed,
    /// Flexible budget; defaults apply and `minimum_percentage` is required
    Flexible,
}

/// PlanItem record as served by the remote data service.
///
/// `spent_amount`, `saved_amount` and `average_daily` are the service's own
/// reported aggregates, kept for display; the engine recomputes the same
/// figures locally from the ledger (see [`crate::core::aggregate`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    /// Unique identifier
    pub id: i64,
    /// Owning plan
    pub plan_id: i64,
    /// Human-readable name of the line
    pub name: String,
    /// Income or expense
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Fixed or flexible
    #[serde(rename = "excludeType")]
    pub exclude_kind: ExcludeKind,
    /// Budget target for the plan period
    pub amount: f64,
    /// Service-reported spent total (display hint)
    pub spent_amount: f64,
    /// Service-reported saved total (display hint)
    pub saved_amount: f64,
    /// Service-reported daily average (display hint)
    pub average_daily: f64,
    /// Advisory floor percentage. Present iff this is a FLEXIBLE expense.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_percentage: Option<f64>,
}

impl PlanItem {
    /// Whether reconciliation may synthesize default transactions for this
    /// item on days without explicit entries. Only flexible expense lines
    /// qualify; FIXED and INCOME lines never fall back to defaults.
    #[must_use]
    pub fn uses_default_fallback(&self) -> bool {
        self.kind == ItemKind::Expense && self.exclude_kind != ExcludeKind::Fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::expense_item;

    #[test]
    fn test_default_fallback_gate() {
        let flexible = expense_item(1, 1, ExcludeKind::Flexible, 1000.0);
        assert!(flexible.uses_default_fallback());

        let fixed = expense_item(2, 1, ExcludeKind::Fixed, 1000.0);
        assert!(!fixed.uses_default_fallback());

        let mut income = expense_item(3, 1, ExcludeKind::Flexible, 1000.0);
        income.kind = ItemKind::Income;
        assert!(!income.uses_default_fallback());
    }

    #[test]
    fn test_wire_field_names() {
        let item = expense_item(7, 3, ExcludeKind::Flexible, 500.0);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["excludeType"], "FLEXIBLE");
        assert_eq!(json["planId"], 3);
    }
}
