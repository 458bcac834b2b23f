//! Derived summary views - per-item and per-plan figures for display.
//!
//! A summary bundles the aggregation result with the classified status so
//! callers render one structure instead of re-deriving figures. Summaries
//! are computed over the plan's *current period*, the calendar window of
//! the plan's `planType` that contains today.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::core::aggregate::{DateRange, LedgerTotals, aggregate_item};
use crate::core::classify::{BudgetStatus, classify, percentage};
use crate::entities::{DailyTransaction, DefaultTransaction, ItemKind, Plan, PlanItem, PlanPeriod};

/// Per-item derived view.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSummary {
    /// The summarized item
    pub item_id: i64,
    /// Item name, carried for display
    pub name: String,
    /// Income or expense
    pub kind: ItemKind,
    /// Aggregated ledger figures over the period
    pub totals: LedgerTotals,
    /// Percent of the item budget spent (0 for a non-positive target)
    pub percentage: f64,
    /// Classified status under the plan's warn levels
    pub status: BudgetStatus,
}

/// Plan-level rollup across items.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanSummary {
    /// The summarized plan
    pub plan_id: i64,
    /// The period window the figures cover
    pub period: DateRange,
    /// Sum of expense item budgets
    pub expense_target: f64,
    /// Sum of expense item spending
    pub expense_spent: f64,
    /// Sum of income item budgets
    pub income_target: f64,
    /// Sum of income actually recorded
    pub income_received: f64,
    /// Expense target minus expense spent; may be negative
    pub remaining: f64,
    /// Percent of the plan's expense budget spent
    pub percentage: f64,
    /// Classified status of the expense rollup
    pub status: BudgetStatus,
    /// Per-item summaries, in item id order
    pub items: Vec<ItemSummary>,
}

/// The calendar window of `period` containing `today`.
///
/// Weekly windows run Monday through Sunday; monthly and yearly windows are
/// the containing calendar month and year.
#[must_use]
pub fn current_period(period: PlanPeriod, today: NaiveDate) -> DateRange {
    match period {
        PlanPeriod::Daily => DateRange::new(today, today),
        PlanPeriod::Weekly => {
            let week = today.week(Weekday::Mon);
            DateRange::new(week.first_day(), week.last_day())
        }
        PlanPeriod::Monthly => {
            let first = today.with_day(1).unwrap_or(today);
            let last = first
                .checked_add_months(Months::new(1))
                .and_then(|next| next.checked_sub_days(Days::new(1)))
                .unwrap_or(today);
            DateRange::new(first, last)
        }
        PlanPeriod::Yearly => {
            let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
            let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
            DateRange::new(first, last)
        }
    }
}

/// Summarizes one item over a window under its plan's warn levels.
///
/// Income lines are always `safe`: the warn tiers describe overspending,
/// which has no meaning for money coming in.
#[must_use]
pub fn summarize_item(
    plan: &Plan,
    item: &PlanItem,
    range: &DateRange,
    ledger: &[&DailyTransaction],
    templates: &[&DefaultTransaction],
) -> ItemSummary {
    let totals = aggregate_item(item, range, ledger, templates);
    let status = if item.kind == ItemKind::Income {
        BudgetStatus::Safe
    } else {
        classify(
            item.amount,
            totals.spent,
            plan.warn_level_yellow,
            plan.warn_level_red,
        )
    };
    ItemSummary {
        item_id: item.id,
        name: item.name.clone(),
        kind: item.kind,
        totals,
        percentage: percentage(item.amount, totals.spent),
        status,
    }
}

/// Rolls a plan's items up over the plan's current period.
#[must_use]
pub fn summarize_plan(
    plan: &Plan,
    items: &[&PlanItem],
    ledger: &[&DailyTransaction],
    templates: &[&DefaultTransaction],
    today: NaiveDate,
) -> PlanSummary {
    let period = current_period(plan.period, today);
    let summaries: Vec<ItemSummary> = items
        .iter()
        .map(|item| summarize_item(plan, item, &period, ledger, templates))
        .collect();

    let mut expense_target = 0.0;
    let mut expense_spent = 0.0;
    let mut income_target = 0.0;
    let mut income_received = 0.0;
    for (item, summary) in items.iter().zip(&summaries) {
        match item.kind {
            ItemKind::Expense => {
                expense_target += item.amount;
                expense_spent += summary.totals.spent;
            }
            ItemKind::Income => {
                income_target += item.amount;
                income_received += summary.totals.spent;
            }
        }
    }

    PlanSummary {
        plan_id: plan.id,
        period,
        expense_target,
        expense_spent,
        income_target,
        income_received,
        remaining: expense_target - expense_spent,
        percentage: percentage(expense_target, expense_spent),
        status: classify(
            expense_target,
            expense_spent,
            plan.warn_level_yellow,
            plan.warn_level_red,
        ),
        items: summaries,
    }
}
