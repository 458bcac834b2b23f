//! Budget entity - a standalone category budget, independent of any Plan.
//!
//! Unlike a plan item, a budget is scoped by category and an explicit date
//! window. Its `spent` figure is derived by filtering the daily ledger by
//! `category_id` over `[start_date, end_date]`, inclusive on both ends.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::plan::PlanPeriod;

/// Standalone budget record as served by the remote data service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Unique identifier
    pub id: i64,
    /// Category the budget tracks
    pub category_id: i64,
    /// Budget target over the window
    pub amount: f64,
    /// First day of the window (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive)
    pub end_date: NaiveDate,
    /// Period granularity used for display grouping
    pub period: PlanPeriod,
}
