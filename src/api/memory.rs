//! In-memory implementation of the repository traits.
//!
//! Note: this is compiled even in the "production" version of the crate so
//! that the whole engine can run, top-to-bottom, without the remote service.
//! Tests also use it to inject remote failures and verify rollback paths.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::api::types::{
    BudgetPatch, DailyLedgerResponse, DailyTransactionPatch, DayGroup, DefaultTransactionPatch,
    DefaultTransactionsResponse, ListResponse, MutationResponse, NewBudget, NewDailyTransaction,
    NewDefaultTransaction, NewPlan, NewPlanItem, Pagination, PlanItemPatch, PlanPatch,
};
use crate::api::{
    BudgetRepository, DailyTransactionRepository, DefaultTransactionRepository,
    PlanItemRepository, PlanRepository,
};
use crate::entities::{Budget, DailyTransaction, DefaultTransaction, Plan, PlanItem, PlanStatus};
use crate::errors::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    plans: BTreeMap<i64, Plan>,
    plan_items: BTreeMap<i64, PlanItem>,
    daily_transactions: BTreeMap<i64, DailyTransaction>,
    default_transactions: BTreeMap<i64, DefaultTransaction>,
    budgets: BTreeMap<i64, Budget>,
    next_id: i64,
    injected_failure: Option<String>,
}

impl Inner {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Pops the injected failure, if any, so exactly one call fails.
    fn check_failure(&mut self) -> Result<()> {
        match self.injected_failure.take() {
            Some(message) => Err(Error::Remote {
                status: Some(500),
                message,
            }),
            None => Ok(()),
        }
    }
}

/// An implementation of the repository traits that holds all records in
/// memory. Ids are assigned from a shared monotonic counter, the way the
/// remote service assigns them.
#[derive(Debug, Default)]
pub struct InMemoryDataService {
    inner: Mutex<Inner>,
}

impl InMemoryDataService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next repository call fail with the given remote message.
    /// Used to exercise rollback and stale-on-failure paths.
    pub async fn inject_failure(&self, message: &str) {
        self.inner.lock().await.injected_failure = Some(message.to_string());
    }

    /// Inserts a plan record verbatim, bypassing id assignment.
    pub async fn seed_plan(&self, plan: Plan) {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(plan.id);
        inner.plans.insert(plan.id, plan);
    }

    /// Inserts a plan item record verbatim, bypassing id assignment.
    pub async fn seed_plan_item(&self, item: PlanItem) {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(item.id);
        inner.plan_items.insert(item.id, item);
    }

    /// Inserts a ledger entry verbatim, bypassing id assignment.
    pub async fn seed_daily_transaction(&self, txn: DailyTransaction) {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(txn.id);
        inner.daily_transactions.insert(txn.id, txn);
    }

    /// Inserts a template verbatim, bypassing id assignment.
    pub async fn seed_default_transaction(&self, template: DefaultTransaction) {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(template.id);
        inner.default_transactions.insert(template.id, template);
    }

    /// Inserts a budget record verbatim, bypassing id assignment.
    pub async fn seed_budget(&self, budget: Budget) {
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(budget.id);
        inner.budgets.insert(budget.id, budget);
    }
}

fn page<T>(records: Vec<T>, skip: u64, limit: u64) -> ListResponse<T> {
    let total = records.len() as u64;
    let items = records
        .into_iter()
        .skip(skip as usize)
        .take(if limit == 0 { usize::MAX } else { limit as usize })
        .collect();
    ListResponse {
        items,
        pagination: Pagination::for_window(total, skip, limit),
    }
}

fn applied<T>(data: T) -> MutationResponse<T> {
    MutationResponse {
        data,
        message: None,
        success: true,
    }
}

#[async_trait]
impl PlanRepository for InMemoryDataService {
    async fn list_plans(&self, skip: u64, limit: u64) -> Result<ListResponse<Plan>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        Ok(page(inner.plans.values().cloned().collect(), skip, limit))
    }

    async fn get_plan(&self, id: i64) -> Result<Plan> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        inner
            .plans
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { entity: "plan", id })
    }

    async fn create_plan(&self, draft: &NewPlan) -> Result<MutationResponse<Plan>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let id = inner.assign_id();
        let plan = Plan {
            id,
            name: draft.name.clone(),
            currency: draft.currency.clone(),
            period: draft.period,
            auto_repeat: draft.auto_repeat,
            auto_adjust_enabled: draft.auto_adjust_enabled,
            daily_min_limit: draft.daily_min_limit,
            warn_level_yellow: draft.warn_level_yellow,
            warn_level_red: draft.warn_level_red,
            status: PlanStatus::Active,
        };
        inner.plans.insert(id, plan.clone());
        Ok(applied(plan))
    }

    async fn update_plan(&self, id: i64, patch: &PlanPatch) -> Result<MutationResponse<Plan>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let plan = inner
            .plans
            .get_mut(&id)
            .ok_or(Error::NotFound { entity: "plan", id })?;
        patch.apply(plan);
        Ok(applied(plan.clone()))
    }

    async fn delete_plan(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if inner.plans.remove(&id).is_none() {
            return Err(Error::NotFound { entity: "plan", id });
        }
        // Cascade: items of the plan and everything they own
        let item_ids: Vec<i64> = inner
            .plan_items
            .values()
            .filter(|item| item.plan_id == id)
            .map(|item| item.id)
            .collect();
        inner.plan_items.retain(|_, item| item.plan_id != id);
        inner
            .daily_transactions
            .retain(|_, txn| !item_ids.contains(&txn.plan_item_id));
        inner
            .default_transactions
            .retain(|_, template| !item_ids.contains(&template.plan_item_id));
        Ok(())
    }

    async fn set_plan_status(
        &self,
        id: i64,
        status: PlanStatus,
    ) -> Result<MutationResponse<Plan>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let plan = inner
            .plans
            .get_mut(&id)
            .ok_or(Error::NotFound { entity: "plan", id })?;
        plan.status = status;
        Ok(applied(plan.clone()))
    }
}

#[async_trait]
impl PlanItemRepository for InMemoryDataService {
    async fn list_plan_items(&self, plan_id: i64) -> Result<ListResponse<PlanItem>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let items: Vec<PlanItem> = inner
            .plan_items
            .values()
            .filter(|item| item.plan_id == plan_id)
            .cloned()
            .collect();
        Ok(page(items, 0, 0))
    }

    async fn get_plan_item(&self, id: i64) -> Result<PlanItem> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        inner.plan_items.get(&id).cloned().ok_or(Error::NotFound {
            entity: "plan item",
            id,
        })
    }

    async fn create_plan_item(&self, draft: &NewPlanItem) -> Result<MutationResponse<PlanItem>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if !inner.plans.contains_key(&draft.plan_id) {
            return Err(Error::NotFound {
                entity: "plan",
                id: draft.plan_id,
            });
        }
        let id = inner.assign_id();
        let item = PlanItem {
            id,
            plan_id: draft.plan_id,
            name: draft.name.clone(),
            kind: draft.kind,
            exclude_kind: draft.exclude_kind,
            amount: draft.amount,
            spent_amount: 0.0,
            saved_amount: 0.0,
            average_daily: 0.0,
            minimum_percentage: draft.minimum_percentage,
        };
        inner.plan_items.insert(id, item.clone());
        Ok(applied(item))
    }

    async fn update_plan_item(
        &self,
        id: i64,
        patch: &PlanItemPatch,
    ) -> Result<MutationResponse<PlanItem>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let item = inner.plan_items.get_mut(&id).ok_or(Error::NotFound {
            entity: "plan item",
            id,
        })?;
        patch.apply(item);
        Ok(applied(item.clone()))
    }

    async fn delete_plan_item(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if inner.plan_items.remove(&id).is_none() {
            return Err(Error::NotFound {
                entity: "plan item",
                id,
            });
        }
        inner
            .daily_transactions
            .retain(|_, txn| txn.plan_item_id != id);
        inner
            .default_transactions
            .retain(|_, template| template.plan_item_id != id);
        Ok(())
    }
}

#[async_trait]
impl DailyTransactionRepository for InMemoryDataService {
    async fn daily_ledger(
        &self,
        _plan_id: i64,
        item_id: i64,
        skip: u64,
        limit: u64,
    ) -> Result<DailyLedgerResponse> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        // Group by day, most recent first; pagination counts days
        let mut by_day: BTreeMap<chrono::NaiveDate, Vec<DailyTransaction>> = BTreeMap::new();
        for txn in inner.daily_transactions.values() {
            if txn.plan_item_id == item_id {
                by_day.entry(txn.date).or_default().push(txn.clone());
            }
        }
        let total = by_day.len() as u64;
        let days: Vec<DayGroup> = by_day
            .into_iter()
            .rev()
            .skip(skip as usize)
            .take(if limit == 0 { usize::MAX } else { limit as usize })
            .map(|(date, transactions)| DayGroup { date, transactions })
            .collect();
        Ok(DailyLedgerResponse {
            days,
            pagination: Pagination::for_window(total, skip, limit),
        })
    }

    async fn create_daily_transaction(
        &self,
        draft: &NewDailyTransaction,
    ) -> Result<MutationResponse<DailyTransaction>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if !inner.plan_items.contains_key(&draft.plan_item_id) {
            return Err(Error::NotFound {
                entity: "plan item",
                id: draft.plan_item_id,
            });
        }
        let id = inner.assign_id();
        let txn = DailyTransaction {
            id,
            plan_item_id: draft.plan_item_id,
            category_id: draft.category_id,
            date: draft.date,
            label: draft.label.clone(),
            amount: draft.amount,
        };
        inner.daily_transactions.insert(id, txn.clone());
        Ok(applied(txn))
    }

    async fn update_daily_transaction(
        &self,
        id: i64,
        patch: &DailyTransactionPatch,
    ) -> Result<MutationResponse<DailyTransaction>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let txn = inner
            .daily_transactions
            .get_mut(&id)
            .ok_or(Error::NotFound {
                entity: "daily transaction",
                id,
            })?;
        patch.apply(txn);
        Ok(applied(txn.clone()))
    }

    async fn delete_daily_transaction(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if inner.daily_transactions.remove(&id).is_none() {
            return Err(Error::NotFound {
                entity: "daily transaction",
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DefaultTransactionRepository for InMemoryDataService {
    async fn default_transactions(
        &self,
        _plan_id: i64,
        item_id: i64,
    ) -> Result<DefaultTransactionsResponse> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let templates: Vec<DefaultTransaction> = inner
            .default_transactions
            .values()
            .filter(|template| template.plan_item_id == item_id)
            .cloned()
            .collect();
        let total = templates.len() as u64;
        Ok(DefaultTransactionsResponse {
            default_transactions: templates,
            pagination: Pagination::for_window(total, 0, 0),
        })
    }

    async fn create_default_transaction(
        &self,
        draft: &NewDefaultTransaction,
    ) -> Result<MutationResponse<DefaultTransaction>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if !inner.plan_items.contains_key(&draft.plan_item_id) {
            return Err(Error::NotFound {
                entity: "plan item",
                id: draft.plan_item_id,
            });
        }
        let id = inner.assign_id();
        let template = DefaultTransaction {
            id,
            plan_item_id: draft.plan_item_id,
            label: draft.label.clone(),
            amount: draft.amount,
            enabled: draft.enabled,
        };
        inner.default_transactions.insert(id, template.clone());
        Ok(applied(template))
    }

    async fn update_default_transaction(
        &self,
        id: i64,
        patch: &DefaultTransactionPatch,
    ) -> Result<MutationResponse<DefaultTransaction>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let template = inner
            .default_transactions
            .get_mut(&id)
            .ok_or(Error::NotFound {
                entity: "default transaction",
                id,
            })?;
        patch.apply(template);
        Ok(applied(template.clone()))
    }

    async fn delete_default_transaction(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if inner.default_transactions.remove(&id).is_none() {
            return Err(Error::NotFound {
                entity: "default transaction",
                id,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BudgetRepository for InMemoryDataService {
    async fn list_budgets(&self, skip: u64, limit: u64) -> Result<ListResponse<Budget>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        Ok(page(inner.budgets.values().cloned().collect(), skip, limit))
    }

    async fn get_budget(&self, id: i64) -> Result<Budget> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        inner.budgets.get(&id).cloned().ok_or(Error::NotFound {
            entity: "budget",
            id,
        })
    }

    async fn create_budget(&self, draft: &NewBudget) -> Result<MutationResponse<Budget>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let id = inner.assign_id();
        let budget = Budget {
            id,
            category_id: draft.category_id,
            amount: draft.amount,
            start_date: draft.start_date,
            end_date: draft.end_date,
            period: draft.period,
        };
        inner.budgets.insert(id, budget.clone());
        Ok(applied(budget))
    }

    async fn update_budget(
        &self,
        id: i64,
        patch: &BudgetPatch,
    ) -> Result<MutationResponse<Budget>> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        let budget = inner.budgets.get_mut(&id).ok_or(Error::NotFound {
            entity: "budget",
            id,
        })?;
        patch.apply(budget);
        Ok(applied(budget.clone()))
    }

    async fn delete_budget(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_failure()?;
        if inner.budgets.remove(&id).is_none() {
            return Err(Error::NotFound {
                entity: "budget",
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{date, plan_draft, txn};

    #[tokio::test]
    async fn test_create_assigns_monotonic_ids() -> Result<()> {
        let service = InMemoryDataService::new();
        let first = service.create_plan(&plan_draft("First")).await?.data;
        let second = service.create_plan(&plan_draft("Second")).await?.data;
        assert!(second.id > first.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_plan_is_not_found() {
        let service = InMemoryDataService::new();
        let result = service.get_plan(99).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "plan", id: 99 }
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_fails_exactly_once() -> Result<()> {
        let service = InMemoryDataService::new();
        service.inject_failure("server exploded").await;

        let err = service.list_plans(0, 10).await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: Some(500), .. }));
        assert!(err.to_string().contains("server exploded"));

        // Next call succeeds again
        assert!(service.list_plans(0, 10).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_plan_cascades() -> Result<()> {
        let service = InMemoryDataService::new();
        let plan = service.create_plan(&plan_draft("Cascade")).await?.data;
        let item = service
            .create_plan_item(&crate::api::types::NewPlanItem {
                plan_id: plan.id,
                name: "Groceries".to_string(),
                kind: crate::entities::ItemKind::Expense,
                exclude_kind: crate::entities::ExcludeKind::Flexible,
                amount: 400.0,
                minimum_percentage: Some(20.0),
            })
            .await?
            .data;
        service
            .seed_daily_transaction(txn(500, item.id, date(2026, 3, 10), 12.5))
            .await;

        service.delete_plan(plan.id).await?;

        assert!(matches!(
            service.get_plan_item(item.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        let ledger = service.daily_ledger(plan.id, item.id, 0, 0).await?;
        assert!(ledger.days.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_ledger_groups_by_day_desc() -> Result<()> {
        let service = InMemoryDataService::new();
        let plan = service.create_plan(&plan_draft("Ledger")).await?.data;
        let item = service
            .create_plan_item(&crate::api::types::NewPlanItem {
                plan_id: plan.id,
                name: "Food".to_string(),
                kind: crate::entities::ItemKind::Expense,
                exclude_kind: crate::entities::ExcludeKind::Flexible,
                amount: 300.0,
                minimum_percentage: Some(10.0),
            })
            .await?
            .data;
        service
            .seed_daily_transaction(txn(100, item.id, date(2026, 3, 10), 5.0))
            .await;
        service
            .seed_daily_transaction(txn(101, item.id, date(2026, 3, 11), 7.0))
            .await;
        service
            .seed_daily_transaction(txn(102, item.id, date(2026, 3, 11), 3.0))
            .await;

        let ledger = service.daily_ledger(plan.id, item.id, 0, 0).await?;
        assert_eq!(ledger.days.len(), 2);
        assert_eq!(ledger.days[0].date, date(2026, 3, 11));
        assert_eq!(ledger.days[0].transactions.len(), 2);
        assert_eq!(ledger.days[1].date, date(2026, 3, 10));
        assert_eq!(ledger.pagination.total, 2);
        Ok(())
    }
}
