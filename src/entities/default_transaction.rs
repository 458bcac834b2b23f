//! DefaultTransaction entity - a recurring daily charge template.
//!
//! Templates are applied by the reconciliation engine when a day has no
//! explicit entries; they are never persisted as ledger rows, so disabling
//! one cannot retroactively change historical aggregates.

use serde::{Deserialize, Serialize};

/// Recurring daily template as served by the remote data service.
/// Only meaningful for EXPENSE items whose exclude kind is not FIXED.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTransaction {
    /// Unique identifier
    pub id: i64,
    /// Owning plan item
    pub plan_item_id: i64,
    /// Human-readable label
    pub label: String,
    /// Amount charged on every day without explicit entries
    pub amount: f64,
    /// Disabled templates are skipped during reconciliation
    pub enabled: bool,
}
