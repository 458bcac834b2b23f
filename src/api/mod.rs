//! Remote data service contract - typed repository interfaces per entity.
//!
//! The engine depends on these traits, never on a concrete client library.
//! [`http::HttpDataService`] implements them over the real service;
//! [`memory::InMemoryDataService`] implements them in memory and is compiled
//! unconditionally so the whole engine can run top-to-bottom without a
//! network.

/// HTTP implementation of the repository traits
pub mod http;
/// In-memory implementation, used by tests and offline runs
pub mod memory;
/// Wire envelope, draft and patch types
pub mod types;

use async_trait::async_trait;

use crate::entities::{Budget, DailyTransaction, DefaultTransaction, Plan, PlanItem, PlanStatus};
use crate::errors::Result;
use types::{
    BudgetPatch, DailyLedgerResponse, DailyTransactionPatch, DefaultTransactionPatch,
    DefaultTransactionsResponse, ListResponse, MutationResponse, NewBudget, NewDailyTransaction,
    NewDefaultTransaction, NewPlan, NewPlanItem, PlanItemPatch, PlanPatch,
};

/// Plan collection operations.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Lists plans in a paginated window.
    async fn list_plans(&self, skip: u64, limit: u64) -> Result<ListResponse<Plan>>;
    /// Fetches one plan by id.
    async fn get_plan(&self, id: i64) -> Result<Plan>;
    /// Creates a plan from a draft.
    async fn create_plan(&self, draft: &NewPlan) -> Result<MutationResponse<Plan>>;
    /// Applies a partial update to a plan.
    async fn update_plan(&self, id: i64, patch: &PlanPatch) -> Result<MutationResponse<Plan>>;
    /// Deletes a plan; the service cascades to its items and ledgers.
    async fn delete_plan(&self, id: i64) -> Result<()>;
    /// Status-only mutation (soft activate/deactivate).
    async fn set_plan_status(&self, id: i64, status: PlanStatus)
    -> Result<MutationResponse<Plan>>;
}

/// PlanItem collection operations.
#[async_trait]
pub trait PlanItemRepository: Send + Sync {
    /// Lists the items of one plan.
    async fn list_plan_items(&self, plan_id: i64) -> Result<ListResponse<PlanItem>>;
    /// Fetches one item by id.
    async fn get_plan_item(&self, id: i64) -> Result<PlanItem>;
    /// Creates an item from a draft.
    async fn create_plan_item(&self, draft: &NewPlanItem) -> Result<MutationResponse<PlanItem>>;
    /// Applies a partial update to an item.
    async fn update_plan_item(
        &self,
        id: i64,
        patch: &PlanItemPatch,
    ) -> Result<MutationResponse<PlanItem>>;
    /// Deletes an item and its ledgers.
    async fn delete_plan_item(&self, id: i64) -> Result<()>;
}

/// Explicit daily-ledger operations.
#[async_trait]
pub trait DailyTransactionRepository: Send + Sync {
    /// Day-grouped ledger query for one item, paginated in days.
    async fn daily_ledger(
        &self,
        plan_id: i64,
        item_id: i64,
        skip: u64,
        limit: u64,
    ) -> Result<DailyLedgerResponse>;
    /// Creates an explicit ledger entry.
    async fn create_daily_transaction(
        &self,
        draft: &NewDailyTransaction,
    ) -> Result<MutationResponse<DailyTransaction>>;
    /// Applies a partial update to a ledger entry.
    async fn update_daily_transaction(
        &self,
        id: i64,
        patch: &DailyTransactionPatch,
    ) -> Result<MutationResponse<DailyTransaction>>;
    /// Deletes a ledger entry.
    async fn delete_daily_transaction(&self, id: i64) -> Result<()>;
}

/// Recurring default-template operations.
#[async_trait]
pub trait DefaultTransactionRepository: Send + Sync {
    /// Lists the templates of one item.
    async fn default_transactions(
        &self,
        plan_id: i64,
        item_id: i64,
    ) -> Result<DefaultTransactionsResponse>;
    /// Creates a template.
    async fn create_default_transaction(
        &self,
        draft: &NewDefaultTransaction,
    ) -> Result<MutationResponse<DefaultTransaction>>;
    /// Applies a partial update to a template.
    async fn update_default_transaction(
        &self,
        id: i64,
        patch: &DefaultTransactionPatch,
    ) -> Result<MutationResponse<DefaultTransaction>>;
    /// Deletes a template.
    async fn delete_default_transaction(&self, id: i64) -> Result<()>;
}

/// Standalone budget operations.
#[async_trait]
pub trait BudgetRepository: Send + Sync {
    /// Lists budgets in a paginated window.
    async fn list_budgets(&self, skip: u64, limit: u64) -> Result<ListResponse<Budget>>;
    /// Fetches one budget by id.
    async fn get_budget(&self, id: i64) -> Result<Budget>;
    /// Creates a budget from a draft.
    async fn create_budget(&self, draft: &NewBudget) -> Result<MutationResponse<Budget>>;
    /// Applies a partial update to a budget.
    async fn update_budget(&self, id: i64, patch: &BudgetPatch)
    -> Result<MutationResponse<Budget>>;
    /// Deletes a budget.
    async fn delete_budget(&self, id: i64) -> Result<()>;
}

/// The full remote contract the engine is generic over.
pub trait DataService:
    PlanRepository
    + PlanItemRepository
    + DailyTransactionRepository
    + DefaultTransactionRepository
    + BudgetRepository
{
}

impl<T> DataService for T where
    T: PlanRepository
        + PlanItemRepository
        + DailyTransactionRepository
        + DefaultTransactionRepository
        + BudgetRepository
{
}
