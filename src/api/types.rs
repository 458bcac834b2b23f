//! Wire types of the remote data service contract.
//!
//! List endpoints return `{items, pagination}`, mutation endpoints return
//! `{data, message?, success}`, and the daily-ledger query returns entries
//! grouped by day. Creation drafts and partial-update patches are separate
//! structs so a patch can never accidentally zero a field it did not name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::{
    Budget, DailyTransaction, DefaultTransaction, ExcludeKind, ItemKind, PlanPeriod, PlanStatus,
};

/// Pagination block attached to every list response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of records in the collection
    pub total: u64,
    /// Offset of the first returned record
    pub skip: u64,
    /// Requested page size
    pub limit: u64,
    /// Number of pages at this limit
    pub total_pages: u64,
    /// 1-based page index of this window
    pub current_page: u64,
}

impl Pagination {
    /// Pagination block for a window over `total` records.
    /// A zero limit yields a single page so callers never divide by zero.
    #[must_use]
    pub fn for_window(total: u64, skip: u64, limit: u64) -> Self {
        let (total_pages, current_page) = if limit == 0 {
            (1, 1)
        } else {
            (total.div_ceil(limit).max(1), skip / limit + 1)
        };
        Self {
            total,
            skip,
            limit,
            total_pages,
            current_page,
        }
    }
}

/// Envelope of every list endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Records in the requested window
    pub items: Vec<T>,
    /// Window metadata
    pub pagination: Pagination,
}

/// Envelope of every mutation endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse<T> {
    /// The created or updated record as persisted by the service
    pub data: T,
    /// Optional service-side message, surfaced verbatim on failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the mutation was applied
    pub success: bool,
}

/// One day's worth of explicit ledger entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    /// Calendar day
    pub date: NaiveDate,
    /// Explicit entries recorded on that day
    pub transactions: Vec<DailyTransaction>,
}

/// Response of the day-grouped ledger query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyLedgerResponse {
    /// Day groups, most recent first
    pub days: Vec<DayGroup>,
    /// Window metadata (counted in days)
    pub pagination: Pagination,
}

/// Response of the default-template query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTransactionsResponse {
    /// Recurring templates of the queried item
    pub default_transactions: Vec<DefaultTransaction>,
    /// Window metadata
    pub pagination: Pagination,
}

/// Draft for creating a plan. The service assigns the id and an ACTIVE
/// status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlan {
    pub name: String,
    pub currency: String,
    #[serde(rename = "planType")]
    pub period: PlanPeriod,
    pub auto_repeat: bool,
    pub auto_adjust_enabled: bool,
    pub daily_min_limit: f64,
    pub warn_level_yellow: f64,
    pub warn_level_red: f64,
}

/// Partial update for a plan; only named fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "planType", skip_serializing_if = "Option::is_none")]
    pub period: Option<PlanPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_repeat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_adjust_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_min_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn_level_yellow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn_level_red: Option<f64>,
}

impl PlanPatch {
    /// Merges the patch into an existing record; unnamed fields are kept.
    pub fn apply(&self, plan: &mut crate::entities::Plan) {
        if let Some(name) = &self.name {
            plan.name = name.clone();
        }
        if let Some(currency) = &self.currency {
            plan.currency = currency.clone();
        }
        if let Some(period) = self.period {
            plan.period = period;
        }
        if let Some(auto_repeat) = self.auto_repeat {
            plan.auto_repeat = auto_repeat;
        }
        if let Some(auto_adjust) = self.auto_adjust_enabled {
            plan.auto_adjust_enabled = auto_adjust;
        }
        if let Some(limit) = self.daily_min_limit {
            plan.daily_min_limit = limit;
        }
        if let Some(yellow) = self.warn_level_yellow {
            plan.warn_level_yellow = yellow;
        }
        if let Some(red) = self.warn_level_red {
            plan.warn_level_red = red;
        }
    }
}

/// Status-only mutation payload for a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStatusPayload {
    /// ACTIVE or INACTIVE
    pub status: PlanStatus,
}

/// Draft for creating a plan item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlanItem {
    pub plan_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(rename = "excludeType")]
    pub exclude_kind: ExcludeKind,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_percentage: Option<f64>,
}

/// Partial update for a plan item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "excludeType", skip_serializing_if = "Option::is_none")]
    pub exclude_kind: Option<ExcludeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_percentage: Option<f64>,
}

impl PlanItemPatch {
    /// Merges the patch into an existing record; unnamed fields are kept.
    pub fn apply(&self, item: &mut crate::entities::PlanItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(amount) = self.amount {
            item.amount = amount;
        }
        if let Some(exclude_kind) = self.exclude_kind {
            item.exclude_kind = exclude_kind;
        }
        if let Some(minimum) = self.minimum_percentage {
            item.minimum_percentage = Some(minimum);
        }
    }
}

/// Draft for creating an explicit ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDailyTransaction {
    pub plan_item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub label: String,
    pub amount: f64,
}

/// Partial update for an explicit ledger entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl DailyTransactionPatch {
    /// Merges the patch into an existing record; unnamed fields are kept.
    pub fn apply(&self, txn: &mut crate::entities::DailyTransaction) {
        if let Some(label) = &self.label {
            txn.label = label.clone();
        }
        if let Some(amount) = self.amount {
            txn.amount = amount;
        }
    }
}

/// Draft for creating a recurring template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDefaultTransaction {
    pub plan_item_id: i64,
    pub label: String,
    pub amount: f64,
    pub enabled: bool,
}

/// Partial update for a recurring template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl DefaultTransactionPatch {
    /// Merges the patch into an existing record; unnamed fields are kept.
    pub fn apply(&self, template: &mut crate::entities::DefaultTransaction) {
        if let Some(label) = &self.label {
            template.label = label.clone();
        }
        if let Some(amount) = self.amount {
            template.amount = amount;
        }
        if let Some(enabled) = self.enabled {
            template.enabled = enabled;
        }
    }
}

/// Draft for creating a standalone budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: i64,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period: PlanPeriod,
}

/// Partial update for a standalone budget.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PlanPeriod>,
}

impl BudgetPatch {
    /// Merges the patch into an existing record; unnamed fields are kept.
    pub fn apply(&self, budget: &mut crate::entities::Budget) {
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        if let Some(start) = self.start_date {
            budget.start_date = start;
        }
        if let Some(end) = self.end_date {
            budget.end_date = end;
        }
        if let Some(period) = self.period {
            budget.period = period;
        }
    }
}

/// What the caller wants recorded against an item, dispatched to the
/// matching repository instead of branching on a boolean deep in a shared
/// handler. Explicit intents write ledger rows; default intents write
/// recurring templates.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionIntent {
    /// An explicit entry for a concrete day (must be today)
    Explicit {
        /// Calendar day, validated against the current day
        date: NaiveDate,
        /// Entry label
        label: String,
        /// Entry amount
        amount: f64,
    },
    /// A recurring daily template
    Default {
        /// Template label
        label: String,
        /// Template amount
        amount: f64,
        /// Whether the template starts out enabled
        enabled: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_windows() {
        let p = Pagination::for_window(45, 0, 10);
        assert_eq!(p.total_pages, 5);
        assert_eq!(p.current_page, 1);

        let p = Pagination::for_window(45, 40, 10);
        assert_eq!(p.current_page, 5);

        // Zero limit must not divide by zero
        let p = Pagination::for_window(45, 0, 0);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.current_page, 1);

        // Empty collections still report one page
        let p = Pagination::for_window(0, 0, 10);
        assert_eq!(p.total_pages, 1);
    }

    #[test]
    fn test_patch_omits_unset_fields() {
        let patch = PlanPatch {
            warn_level_yellow: Some(40.0),
            ..PlanPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["warnLevelYellow"], 40.0);
        assert!(json.get("name").is_none());
        assert!(json.get("planType").is_none());
    }
}
