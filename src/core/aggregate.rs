//! Budget aggregation - spent, remaining, daily average over a date range.
//!
//! Aggregation runs over *effective* transactions (see
//! [`crate::core::reconcile`]) day by day, so default templates count on
//! days without explicit entries exactly as reconciliation defines.
//! Remaining is never clamped: a negative value means over budget and its
//! sign is load-bearing for classification and display.

use chrono::{Days, NaiveDate};

use crate::core::reconcile::effective_transactions;
use crate::entities::{Budget, DailyTransaction, DefaultTransaction, ItemKind, PlanItem};

/// Inclusive calendar window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    /// First day, inclusive
    pub start: NaiveDate,
    /// Last day, inclusive
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range. An inverted range is allowed and simply contains no
    /// days.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the window, both ends inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterates every day of the window in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(
            (self.start <= self.end).then_some(self.start),
            move |day| {
                let next = day.checked_add_days(Days::new(1))?;
                (next <= end).then_some(next)
            },
        )
    }
}

/// Aggregated ledger figures for an item or budget over a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LedgerTotals {
    /// Sum of effective transaction amounts
    pub spent: f64,
    /// Target minus spent; negative means over budget
    pub remaining: f64,
    /// Spent divided by the number of observed transactions, 0 when empty
    pub average_daily: f64,
    /// Number of effective transactions observed
    pub count: usize,
}

impl LedgerTotals {
    fn from_sum(target_amount: f64, spent: f64, count: usize) -> Self {
        let average_daily = if count == 0 { 0.0 } else { spent / count as f64 };
        Self {
            spent,
            remaining: target_amount - spent,
            average_daily,
            count,
        }
    }
}

/// Aggregates one plan item over a window, reconciling each day.
#[must_use]
pub fn aggregate_item(
    item: &PlanItem,
    range: &DateRange,
    ledger: &[&DailyTransaction],
    templates: &[&DefaultTransaction],
) -> LedgerTotals {
    let mut spent = 0.0;
    let mut count = 0;
    for day in range.days() {
        for txn in effective_transactions(item, day, ledger, templates) {
            spent += txn.amount;
            count += 1;
        }
    }
    LedgerTotals::from_sum(item.amount, spent, count)
}

/// Aggregates a standalone budget by filtering the raw ledger by category
/// over `[start_date, end_date]`, both ends inclusive.
///
/// Only expense rows count: the direction of a row is resolved through its
/// owning plan item, and rows without an owning item are standalone
/// category expenses by definition.
#[must_use]
pub fn aggregate_budget(
    budget: &Budget,
    ledger: &[&DailyTransaction],
    items: &[&PlanItem],
) -> LedgerTotals {
    let range = DateRange::new(budget.start_date, budget.end_date);
    let mut spent = 0.0;
    let mut count = 0;
    for txn in ledger {
        if txn.category_id != Some(budget.category_id) || !range.contains(txn.date) {
            continue;
        }
        let kind = items
            .iter()
            .find(|item| item.id == txn.plan_item_id)
            .map_or(ItemKind::Expense, |item| item.kind);
        if kind != ItemKind::Expense {
            continue;
        }
        spent += txn.amount;
        count += 1;
    }
    LedgerTotals::from_sum(budget.amount, spent, count)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::ExcludeKind;
    use crate::test_utils::{
        budget_fixture, date, default_txn, expense_item, income_item, txn, txn_in_category,
    };

    #[test]
    fn test_date_range_days_inclusive() {
        let range = DateRange::new(date(2026, 3, 1), date(2026, 3, 3));
        let days: Vec<NaiveDate> = range.days().collect();
        assert_eq!(
            days,
            vec![date(2026, 3, 1), date(2026, 3, 2), date(2026, 3, 3)]
        );

        // Inverted window contains no days
        let inverted = DateRange::new(date(2026, 3, 3), date(2026, 3, 1));
        assert_eq!(inverted.days().count(), 0);
    }

    #[test]
    fn test_item_aggregation_mixes_explicit_and_default_days() {
        let item = expense_item(1, 1, ExcludeKind::Flexible, 1000.0);
        // Day 1 has explicit entries, day 2 falls back to the template
        let ledger = [
            txn(10, 1, date(2026, 3, 1), 120.0),
            txn(11, 1, date(2026, 3, 1), 30.0),
        ];
        let templates = [default_txn(20, 1, 50.0, true)];

        let totals = aggregate_item(
            &item,
            &DateRange::new(date(2026, 3, 1), date(2026, 3, 2)),
            &ledger.iter().collect::<Vec<_>>(),
            &templates.iter().collect::<Vec<_>>(),
        );

        assert_eq!(totals.spent, 200.0);
        assert_eq!(totals.count, 3);
        assert_eq!(totals.remaining, 800.0);
        assert_eq!(totals.average_daily, 200.0 / 3.0);
    }

    #[test]
    fn test_remaining_goes_negative_when_over_budget() {
        let item = expense_item(1, 1, ExcludeKind::Fixed, 100.0);
        let ledger = [txn(10, 1, date(2026, 3, 1), 250.0)];

        let totals = aggregate_item(
            &item,
            &DateRange::new(date(2026, 3, 1), date(2026, 3, 1)),
            &ledger.iter().collect::<Vec<_>>(),
            &[],
        );

        assert_eq!(totals.remaining, -150.0, "never clamp to zero");
    }

    #[test]
    fn test_empty_ledger_yields_zeros_not_nan() {
        let item = expense_item(1, 1, ExcludeKind::Fixed, 100.0);
        let totals = aggregate_item(
            &item,
            &DateRange::new(date(2026, 3, 1), date(2026, 3, 7)),
            &[],
            &[],
        );

        assert_eq!(totals.spent, 0.0);
        assert_eq!(totals.count, 0);
        assert_eq!(totals.average_daily, 0.0);
        assert_eq!(totals.remaining, 100.0);
    }

    #[test]
    fn test_budget_filters_category_and_window_inclusive() {
        let budget = budget_fixture(1, 7, 500.0, date(2026, 3, 1), date(2026, 3, 31));
        let ledger = [
            txn_in_category(10, 1, 7, date(2026, 3, 1), 50.0),  // first day counts
            txn_in_category(11, 1, 7, date(2026, 3, 31), 25.0), // last day counts
            txn_in_category(12, 1, 7, date(2026, 4, 1), 99.0),  // outside window
            txn_in_category(13, 1, 8, date(2026, 3, 10), 99.0), // other category
            txn(14, 1, date(2026, 3, 10), 99.0),                // no category
        ];

        let totals = aggregate_budget(&budget, &ledger.iter().collect::<Vec<_>>(), &[]);

        assert_eq!(totals.spent, 75.0);
        assert_eq!(totals.count, 2);
        assert_eq!(totals.remaining, 425.0);
    }

    #[test]
    fn test_budget_excludes_income_rows() {
        let budget = budget_fixture(1, 7, 500.0, date(2026, 3, 1), date(2026, 3, 31));
        let income = income_item(2, 1, 3000.0);
        let expense = expense_item(3, 1, ExcludeKind::Fixed, 100.0);
        let ledger = [
            txn_in_category(10, 2, 7, date(2026, 3, 5), 200.0), // income row, skipped
            txn_in_category(11, 3, 7, date(2026, 3, 5), 40.0),  // expense row
            txn_in_category(12, 99, 7, date(2026, 3, 6), 10.0), // no owning item: expense
        ];

        let totals = aggregate_budget(
            &budget,
            &ledger.iter().collect::<Vec<_>>(),
            &[&income, &expense],
        );

        assert_eq!(totals.spent, 50.0);
        assert_eq!(totals.count, 2);
    }

    #[test]
    fn test_zero_amount_budget_well_defined() {
        let budget = budget_fixture(1, 7, 0.0, date(2026, 3, 1), date(2026, 3, 31));
        let ledger = [txn_in_category(10, 1, 7, date(2026, 3, 5), 40.0)];

        let totals = aggregate_budget(&budget, &ledger.iter().collect::<Vec<_>>(), &[]);

        assert_eq!(totals.spent, 40.0);
        assert_eq!(totals.remaining, -40.0);
        assert!(totals.average_daily.is_finite());
    }
}
