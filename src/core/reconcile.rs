//! Ledger reconciliation - the effective transaction set for one day.
//!
//! Explicit entries for a day fully override the recurring defaults; there
//! is no merging. Defaults only ever synthesize in-memory entries, stamped
//! with the queried date, and are never persisted as ledger rows, so
//! disabling a template cannot rewrite history that was recorded
//! explicitly.

use chrono::NaiveDate;

use crate::entities::{DailyTransaction, DefaultTransaction, ItemKind, PlanItem};

/// Where an effective transaction came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionOrigin {
    /// A persisted [`DailyTransaction`] row
    Explicit,
    /// Synthesized from an enabled [`DefaultTransaction`] template
    DefaultTemplate,
}

/// One reconciled transaction, as of query time.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveTransaction {
    /// Id of the backing row or template
    pub source_id: i64,
    /// Owning plan item
    pub plan_item_id: i64,
    /// The queried day
    pub date: NaiveDate,
    /// Label of the entry or template
    pub label: String,
    /// Amount of the entry or template
    pub amount: f64,
    /// Whether this entry is persisted or synthesized
    pub origin: TransactionOrigin,
    /// Direction inherited from the owning item
    pub kind: ItemKind,
}

impl EffectiveTransaction {
    /// Synthesized entries are not persisted, so they can never be edited;
    /// the "today" mutation path must create an explicit entry instead.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.origin == TransactionOrigin::DefaultTemplate
    }
}

/// Produces the ordered effective transactions of `item` on `date`.
///
/// `ledger` and `templates` may be whole-store slices; filtering by item
/// and day happens here. The precedence rules:
///
/// 1. If any explicit entry exists for the day, those entries are the
///    result, verbatim.
/// 2. Otherwise, a flexible expense item synthesizes one entry per enabled
///    template, stamped with the queried date.
/// 3. FIXED and INCOME items get no fallback; empty is correct and final.
#[must_use]
pub fn effective_transactions(
    item: &PlanItem,
    date: NaiveDate,
    ledger: &[&DailyTransaction],
    templates: &[&DefaultTransaction],
) -> Vec<EffectiveTransaction> {
    let mut explicit: Vec<&DailyTransaction> = ledger
        .iter()
        .filter(|txn| txn.plan_item_id == item.id && txn.date == date)
        .copied()
        .collect();
    explicit.sort_by_key(|txn| txn.id);

    if !explicit.is_empty() {
        return explicit
            .into_iter()
            .map(|txn| EffectiveTransaction {
                source_id: txn.id,
                plan_item_id: item.id,
                date,
                label: txn.label.clone(),
                amount: txn.amount,
                origin: TransactionOrigin::Explicit,
                kind: item.kind,
            })
            .collect();
    }

    if !item.uses_default_fallback() {
        return Vec::new();
    }

    let mut enabled: Vec<&DefaultTransaction> = templates
        .iter()
        .filter(|template| template.plan_item_id == item.id && template.enabled)
        .copied()
        .collect();
    enabled.sort_by_key(|template| template.id);

    enabled
        .into_iter()
        .map(|template| EffectiveTransaction {
            source_id: template.id,
            plan_item_id: item.id,
            date,
            label: template.label.clone(),
            amount: template.amount,
            origin: TransactionOrigin::DefaultTemplate,
            kind: item.kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::ExcludeKind;
    use crate::test_utils::{date, default_txn, expense_item, income_item, txn};

    #[test]
    fn test_explicit_entries_override_defaults_verbatim() {
        let item = expense_item(1, 1, ExcludeKind::Flexible, 1000.0);
        let ledger = [txn(10, 1, date(2026, 3, 14), 25.0)];
        let templates = [default_txn(20, 1, 50.0, true), default_txn(21, 1, 30.0, true)];

        let effective = effective_transactions(
            &item,
            date(2026, 3, 14),
            &ledger.iter().collect::<Vec<_>>(),
            &templates.iter().collect::<Vec<_>>(),
        );

        assert_eq!(effective.len(), 1, "defaults must never merge in");
        assert_eq!(effective[0].amount, 25.0);
        assert_eq!(effective[0].origin, TransactionOrigin::Explicit);
        assert_eq!(effective[0].source_id, 10);
    }

    #[test]
    fn test_flexible_expense_synthesizes_enabled_defaults() {
        let item = expense_item(1, 1, ExcludeKind::Flexible, 1000.0);
        let templates = [
            default_txn(20, 1, 50.0, true),
            default_txn(21, 1, 30.0, true),
            default_txn(22, 1, 99.0, false), // disabled, skipped
        ];

        let effective = effective_transactions(
            &item,
            date(2026, 3, 14),
            &[],
            &templates.iter().collect::<Vec<_>>(),
        );

        assert_eq!(effective.len(), 2);
        let total: f64 = effective.iter().map(|txn| txn.amount).sum();
        assert_eq!(total, 80.0);
        assert!(effective.iter().all(EffectiveTransaction::is_synthesized));
        assert!(
            effective.iter().all(|txn| txn.date == date(2026, 3, 14)),
            "synthesized entries are stamped with the queried date"
        );
    }

    #[test]
    fn test_fixed_expense_never_synthesizes() {
        let item = expense_item(1, 1, ExcludeKind::Fixed, 1000.0);
        let templates = [default_txn(20, 1, 50.0, true), default_txn(21, 1, 30.0, true)];

        let effective = effective_transactions(
            &item,
            date(2026, 3, 14),
            &[],
            &templates.iter().collect::<Vec<_>>(),
        );

        assert!(effective.is_empty());
    }

    #[test]
    fn test_income_never_synthesizes() {
        let item = income_item(1, 1, 3000.0);
        let templates = [default_txn(20, 1, 50.0, true)];

        let effective = effective_transactions(
            &item,
            date(2026, 3, 14),
            &[],
            &templates.iter().collect::<Vec<_>>(),
        );

        assert!(effective.is_empty());
    }

    #[test]
    fn test_other_days_and_items_are_filtered_out() {
        let item = expense_item(1, 1, ExcludeKind::Flexible, 1000.0);
        let ledger = [
            txn(10, 1, date(2026, 3, 13), 25.0), // wrong day
            txn(11, 2, date(2026, 3, 14), 40.0), // wrong item
        ];
        let templates = [default_txn(20, 1, 50.0, true)];

        let effective = effective_transactions(
            &item,
            date(2026, 3, 14),
            &ledger.iter().collect::<Vec<_>>(),
            &templates.iter().collect::<Vec<_>>(),
        );

        // No explicit entry matches the exact day, so the default applies
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].origin, TransactionOrigin::DefaultTemplate);
    }

    #[test]
    fn test_explicit_entries_keep_id_order() {
        let item = expense_item(1, 1, ExcludeKind::Flexible, 1000.0);
        let ledger = [
            txn(12, 1, date(2026, 3, 14), 3.0),
            txn(10, 1, date(2026, 3, 14), 1.0),
            txn(11, 1, date(2026, 3, 14), 2.0),
        ];

        let effective = effective_transactions(
            &item,
            date(2026, 3, 14),
            &ledger.iter().collect::<Vec<_>>(),
            &[],
        );

        let ids: Vec<i64> = effective.iter().map(|txn| txn.source_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }
}
