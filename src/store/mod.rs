//! Normalized in-memory entity store.
//!
//! The store is the only shared mutable state of the engine. Every record is
//! keyed by id; refetches replace whole slices (a list refetch drops records
//! the service no longer returns) and mutations apply optimistically with
//! enough returned state to roll back. Derived computations take `&self`
//! under a read guard, which is all the snapshot consistency a cooperative
//! scheduler needs.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::api::types::DayGroup;
use crate::entities::{Budget, DailyTransaction, DefaultTransaction, Plan, PlanItem};

/// Everything removed by a plan-delete cascade, kept so a failed remote
/// delete can be rolled back.
#[derive(Debug, Clone)]
pub struct PlanCascade {
    /// The removed plan
    pub plan: Plan,
    /// Its items
    pub items: Vec<PlanItem>,
    /// Ledger entries of those items
    pub transactions: Vec<DailyTransaction>,
    /// Recurring templates of those items
    pub templates: Vec<DefaultTransaction>,
}

/// Everything removed by an item-delete cascade.
#[derive(Debug, Clone)]
pub struct ItemCascade {
    /// The removed item
    pub item: PlanItem,
    /// Its ledger entries
    pub transactions: Vec<DailyTransaction>,
    /// Its recurring templates
    pub templates: Vec<DefaultTransaction>,
}

/// Normalized store of all fetched records.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    plans: HashMap<i64, Plan>,
    plan_items: HashMap<i64, PlanItem>,
    daily_transactions: HashMap<i64, DailyTransaction>,
    default_transactions: HashMap<i64, DefaultTransaction>,
    budgets: HashMap<i64, Budget>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- plans ---

    /// Inserts or replaces a plan.
    pub fn upsert_plan(&mut self, plan: Plan) {
        self.plans.insert(plan.id, plan);
    }

    /// Looks up a plan by id.
    #[must_use]
    pub fn plan(&self, id: i64) -> Option<&Plan> {
        self.plans.get(&id)
    }

    /// All plans, ordered by id.
    #[must_use]
    pub fn plans(&self) -> Vec<&Plan> {
        let mut plans: Vec<&Plan> = self.plans.values().collect();
        plans.sort_by_key(|plan| plan.id);
        plans
    }

    /// Removes a plan together with its items, ledger entries and templates.
    /// Returns the removed records so a failed remote delete can restore
    /// them, or `None` when the plan was never in the store.
    pub fn remove_plan_cascade(&mut self, id: i64) -> Option<PlanCascade> {
        let plan = self.plans.remove(&id)?;
        let item_ids: Vec<i64> = self
            .plan_items
            .values()
            .filter(|item| item.plan_id == id)
            .map(|item| item.id)
            .collect();
        let items = item_ids
            .iter()
            .filter_map(|item_id| self.plan_items.remove(item_id))
            .collect();
        let (transactions, templates) = self.drain_item_children(&item_ids);
        Some(PlanCascade {
            plan,
            items,
            transactions,
            templates,
        })
    }

    /// Reinserts everything a cascade removed.
    pub fn restore_plan_cascade(&mut self, cascade: PlanCascade) {
        self.plans.insert(cascade.plan.id, cascade.plan);
        for item in cascade.items {
            self.plan_items.insert(item.id, item);
        }
        for txn in cascade.transactions {
            self.daily_transactions.insert(txn.id, txn);
        }
        for template in cascade.templates {
            self.default_transactions.insert(template.id, template);
        }
    }

    // --- plan items ---

    /// Inserts or replaces a plan item.
    pub fn upsert_plan_item(&mut self, item: PlanItem) {
        self.plan_items.insert(item.id, item);
    }

    /// Looks up a plan item by id.
    #[must_use]
    pub fn plan_item(&self, id: i64) -> Option<&PlanItem> {
        self.plan_items.get(&id)
    }

    /// Items of one plan, ordered by id.
    #[must_use]
    pub fn items_of_plan(&self, plan_id: i64) -> Vec<&PlanItem> {
        let mut items: Vec<&PlanItem> = self
            .plan_items
            .values()
            .filter(|item| item.plan_id == plan_id)
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }

    /// Replaces the full item slice of a plan with a fetched list.
    /// Records the service no longer returns are dropped.
    pub fn replace_items_of_plan(&mut self, plan_id: i64, items: Vec<PlanItem>) {
        self.plan_items.retain(|_, item| item.plan_id != plan_id);
        for item in items {
            self.plan_items.insert(item.id, item);
        }
    }

    /// Removes an item together with its ledger entries and templates.
    pub fn remove_item_cascade(&mut self, id: i64) -> Option<ItemCascade> {
        let item = self.plan_items.remove(&id)?;
        let (transactions, templates) = self.drain_item_children(&[id]);
        Some(ItemCascade {
            item,
            transactions,
            templates,
        })
    }

    /// Reinserts everything an item cascade removed.
    pub fn restore_item_cascade(&mut self, cascade: ItemCascade) {
        self.plan_items.insert(cascade.item.id, cascade.item);
        for txn in cascade.transactions {
            self.daily_transactions.insert(txn.id, txn);
        }
        for template in cascade.templates {
            self.default_transactions.insert(template.id, template);
        }
    }

    fn drain_item_children(
        &mut self,
        item_ids: &[i64],
    ) -> (Vec<DailyTransaction>, Vec<DefaultTransaction>) {
        let txn_ids: Vec<i64> = self
            .daily_transactions
            .values()
            .filter(|txn| item_ids.contains(&txn.plan_item_id))
            .map(|txn| txn.id)
            .collect();
        let transactions = txn_ids
            .iter()
            .filter_map(|txn_id| self.daily_transactions.remove(txn_id))
            .collect();
        let template_ids: Vec<i64> = self
            .default_transactions
            .values()
            .filter(|template| item_ids.contains(&template.plan_item_id))
            .map(|template| template.id)
            .collect();
        let templates = template_ids
            .iter()
            .filter_map(|template_id| self.default_transactions.remove(template_id))
            .collect();
        (transactions, templates)
    }

    // --- daily transactions ---

    /// Inserts or replaces a ledger entry.
    pub fn upsert_daily_transaction(&mut self, txn: DailyTransaction) {
        self.daily_transactions.insert(txn.id, txn);
    }

    /// Looks up a ledger entry by id.
    #[must_use]
    pub fn daily_transaction(&self, id: i64) -> Option<&DailyTransaction> {
        self.daily_transactions.get(&id)
    }

    /// Removes a ledger entry, returning it for rollback.
    pub fn remove_daily_transaction(&mut self, id: i64) -> Option<DailyTransaction> {
        self.daily_transactions.remove(&id)
    }

    /// Ledger entries of one item, ordered by date then id.
    #[must_use]
    pub fn ledger_of_item(&self, item_id: i64) -> Vec<&DailyTransaction> {
        let mut entries: Vec<&DailyTransaction> = self
            .daily_transactions
            .values()
            .filter(|txn| txn.plan_item_id == item_id)
            .collect();
        entries.sort_by_key(|txn| (txn.date, txn.id));
        entries
    }

    /// All ledger entries, in arbitrary order. Used by category filters.
    pub fn daily_transactions(&self) -> impl Iterator<Item = &DailyTransaction> {
        self.daily_transactions.values()
    }

    /// Replaces the fetched day-groups of an item. Only the returned days
    /// are touched; other days keep whatever the store already holds.
    pub fn replace_ledger_days(&mut self, item_id: i64, days: &[DayGroup]) {
        let fetched_days: Vec<NaiveDate> = days.iter().map(|group| group.date).collect();
        self.daily_transactions.retain(|_, txn| {
            txn.plan_item_id != item_id || !fetched_days.contains(&txn.date)
        });
        for group in days {
            for txn in &group.transactions {
                self.daily_transactions.insert(txn.id, txn.clone());
            }
        }
    }

    // --- default transactions ---

    /// Inserts or replaces a template.
    pub fn upsert_default_transaction(&mut self, template: DefaultTransaction) {
        self.default_transactions.insert(template.id, template);
    }

    /// Looks up a template by id.
    #[must_use]
    pub fn default_transaction(&self, id: i64) -> Option<&DefaultTransaction> {
        self.default_transactions.get(&id)
    }

    /// Removes a template, returning it for rollback.
    pub fn remove_default_transaction(&mut self, id: i64) -> Option<DefaultTransaction> {
        self.default_transactions.remove(&id)
    }

    /// Templates of one item, ordered by id.
    #[must_use]
    pub fn defaults_of_item(&self, item_id: i64) -> Vec<&DefaultTransaction> {
        let mut templates: Vec<&DefaultTransaction> = self
            .default_transactions
            .values()
            .filter(|template| template.plan_item_id == item_id)
            .collect();
        templates.sort_by_key(|template| template.id);
        templates
    }

    /// Replaces the full template slice of an item with a fetched list.
    pub fn replace_defaults_of_item(&mut self, item_id: i64, templates: Vec<DefaultTransaction>) {
        self.default_transactions
            .retain(|_, template| template.plan_item_id != item_id);
        for template in templates {
            self.default_transactions.insert(template.id, template);
        }
    }

    // --- budgets ---

    /// Inserts or replaces a budget.
    pub fn upsert_budget(&mut self, budget: Budget) {
        self.budgets.insert(budget.id, budget);
    }

    /// Looks up a budget by id.
    #[must_use]
    pub fn budget(&self, id: i64) -> Option<&Budget> {
        self.budgets.get(&id)
    }

    /// Removes a budget, returning it for rollback.
    pub fn remove_budget(&mut self, id: i64) -> Option<Budget> {
        self.budgets.remove(&id)
    }

    /// All budgets, ordered by id.
    #[must_use]
    pub fn budgets(&self) -> Vec<&Budget> {
        let mut budgets: Vec<&Budget> = self.budgets.values().collect();
        budgets.sort_by_key(|budget| budget.id);
        budgets
    }
}
