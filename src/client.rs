//! Planner facade - cached reads and optimistic mutations.
//!
//! `Planner` binds a [`DataService`] implementation, the normalized
//! [`EntityStore`] and the [`QueryCache`] into the engine's data flow: a
//! mutation validates locally, applies to the store optimistically, calls
//! the service, and on either outcome invalidates the tags it declared; a
//! read serves fresh cache hits and otherwise refetches, feeding the store
//! before committing the cache entry under the identity captured at fetch
//! start.

use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::types::{
    BudgetPatch, DailyLedgerResponse, DailyTransactionPatch, DefaultTransactionPatch,
    DefaultTransactionsResponse, ListResponse, MutationResponse, NewBudget, NewDailyTransaction,
    NewDefaultTransaction, NewPlan, NewPlanItem, PlanItemPatch, PlanPatch, TransactionIntent,
};
use crate::api::DataService;
use crate::cache::{CachedValue, QueryCache, QueryKey, Tag};
use crate::core::aggregate::{DateRange, LedgerTotals, aggregate_budget};
use crate::core::summary::{ItemSummary, PlanSummary, current_period, summarize_item, summarize_plan};
use crate::core::validate;
use crate::entities::{
    Budget, DailyTransaction, DefaultTransaction, Plan, PlanItem, PlanStatus,
};
use crate::errors::{Error, Result};
use crate::store::EntityStore;

/// What [`Planner::record_transaction`] created, depending on the intent.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedTransaction {
    /// An explicit ledger entry was written
    Explicit(DailyTransaction),
    /// A recurring template was written
    Default(DefaultTransaction),
}

/// Client-side planning engine over a remote data service.
pub struct Planner<S: DataService> {
    service: S,
    store: RwLock<EntityStore>,
    cache: RwLock<QueryCache>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Unwraps a mutation envelope, treating `success == false` as a remote
/// rejection with the payload message.
fn applied<T>(response: MutationResponse<T>) -> Result<T> {
    if response.success {
        Ok(response.data)
    } else {
        Err(Error::Remote {
            status: None,
            message: response
                .message
                .unwrap_or_else(|| "mutation rejected by the remote service".to_string()),
        })
    }
}

impl<S: DataService> Planner<S> {
    /// Creates an engine over the given service with empty local state.
    pub fn new(service: S) -> Self {
        Self {
            service,
            store: RwLock::new(EntityStore::new()),
            cache: RwLock::new(QueryCache::new()),
        }
    }

    /// Read access to the underlying service, mainly for test seeding.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Freshness state of a cached query, for auditing and tests.
    pub async fn query_state(&self, key: &QueryKey) -> Option<crate::cache::QueryState> {
        self.cache.read().await.state(key)
    }

    async fn invalidate(&self, tags: impl IntoIterator<Item = Tag>) {
        self.cache.write().await.invalidate(tags);
    }

    // ----- cached reads -----

    /// Plans, paginated.
    pub async fn plans(&self, skip: u64, limit: u64) -> Result<ListResponse<Plan>> {
        let key = QueryKey::Plans { skip, limit };
        if let Some(CachedValue::Plans(list)) = self.cache.read().await.fresh_value(&key) {
            return Ok(list.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.list_plans(skip, limit).await {
            Ok(list) => {
                {
                    let mut store = self.store.write().await;
                    for plan in &list.items {
                        store.upsert_plan(plan.clone());
                    }
                }
                let mut tags: HashSet<Tag> = HashSet::from([Tag::PlanList]);
                tags.extend(list.items.iter().map(|plan| Tag::Plan(plan.id)));
                self.cache
                    .write()
                    .await
                    .commit(key, CachedValue::Plans(list.clone()), tags, started);
                Ok(list)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// One plan's detail record.
    pub async fn plan(&self, id: i64) -> Result<Plan> {
        let key = QueryKey::Plan(id);
        if let Some(CachedValue::Plan(plan)) = self.cache.read().await.fresh_value(&key) {
            return Ok(plan.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.get_plan(id).await {
            Ok(plan) => {
                self.store.write().await.upsert_plan(plan.clone());
                self.cache.write().await.commit(
                    key,
                    CachedValue::Plan(plan.clone()),
                    HashSet::from([Tag::Plan(id)]),
                    started,
                );
                Ok(plan)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// The items of one plan.
    pub async fn plan_items(&self, plan_id: i64) -> Result<ListResponse<PlanItem>> {
        let key = QueryKey::PlanItems(plan_id);
        if let Some(CachedValue::PlanItems(list)) = self.cache.read().await.fresh_value(&key) {
            return Ok(list.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.list_plan_items(plan_id).await {
            Ok(list) => {
                self.store
                    .write()
                    .await
                    .replace_items_of_plan(plan_id, list.items.clone());
                let mut tags: HashSet<Tag> = HashSet::from([Tag::PlanItemList(plan_id)]);
                tags.extend(list.items.iter().map(|item| Tag::PlanItem(item.id)));
                self.cache
                    .write()
                    .await
                    .commit(key, CachedValue::PlanItems(list.clone()), tags, started);
                Ok(list)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// One item's detail record.
    pub async fn plan_item(&self, id: i64) -> Result<PlanItem> {
        let key = QueryKey::PlanItem(id);
        if let Some(CachedValue::PlanItem(item)) = self.cache.read().await.fresh_value(&key) {
            return Ok(item.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.get_plan_item(id).await {
            Ok(item) => {
                self.store.write().await.upsert_plan_item(item.clone());
                self.cache.write().await.commit(
                    key,
                    CachedValue::PlanItem(item.clone()),
                    HashSet::from([Tag::PlanItem(id)]),
                    started,
                );
                Ok(item)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// Day-grouped ledger window of one item.
    pub async fn daily_ledger(
        &self,
        plan_id: i64,
        item_id: i64,
        skip: u64,
        limit: u64,
    ) -> Result<DailyLedgerResponse> {
        let key = QueryKey::DailyLedger {
            plan_id,
            item_id,
            skip,
            limit,
        };
        if let Some(CachedValue::DailyLedger(ledger)) = self.cache.read().await.fresh_value(&key) {
            return Ok(ledger.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.daily_ledger(plan_id, item_id, skip, limit).await {
            Ok(ledger) => {
                self.store
                    .write()
                    .await
                    .replace_ledger_days(item_id, &ledger.days);
                let mut tags: HashSet<Tag> = HashSet::from([Tag::DailyLedger(item_id)]);
                for day in &ledger.days {
                    tags.extend(day.transactions.iter().map(|txn| Tag::DailyTransaction(txn.id)));
                }
                self.cache
                    .write()
                    .await
                    .commit(key, CachedValue::DailyLedger(ledger.clone()), tags, started);
                Ok(ledger)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// Recurring templates of one item.
    pub async fn default_transactions(
        &self,
        plan_id: i64,
        item_id: i64,
    ) -> Result<DefaultTransactionsResponse> {
        let key = QueryKey::DefaultTransactions { plan_id, item_id };
        if let Some(CachedValue::DefaultTransactions(response)) =
            self.cache.read().await.fresh_value(&key)
        {
            return Ok(response.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.default_transactions(plan_id, item_id).await {
            Ok(response) => {
                self.store
                    .write()
                    .await
                    .replace_defaults_of_item(item_id, response.default_transactions.clone());
                let mut tags: HashSet<Tag> = HashSet::from([Tag::DefaultTransactionList(item_id)]);
                tags.extend(
                    response
                        .default_transactions
                        .iter()
                        .map(|template| Tag::DefaultTransaction(template.id)),
                );
                self.cache.write().await.commit(
                    key,
                    CachedValue::DefaultTransactions(response.clone()),
                    tags,
                    started,
                );
                Ok(response)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// Derived summary of one item over its plan's current period.
    pub async fn item_summary(&self, plan_id: i64, item_id: i64) -> Result<ItemSummary> {
        let plan = self.plan(plan_id).await?;
        let range = current_period(plan.period, today());
        let key = QueryKey::ItemSummary {
            item_id,
            start: range.start,
            end: range.end,
        };
        if let Some(CachedValue::ItemSummary(summary)) = self.cache.read().await.fresh_value(&key)
        {
            return Ok(summary.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.refresh_item_inputs(plan_id, item_id, &range).await {
            Ok(item) => {
                let summary = {
                    let store = self.store.read().await;
                    summarize_item(
                        &plan,
                        &item,
                        &range,
                        &store.ledger_of_item(item_id),
                        &store.defaults_of_item(item_id),
                    )
                };
                let tags = HashSet::from([
                    Tag::Plan(plan_id),
                    Tag::PlanItem(item_id),
                    Tag::DailyLedger(item_id),
                    Tag::DefaultTransactionList(item_id),
                ]);
                self.cache.write().await.commit(
                    key,
                    CachedValue::ItemSummary(summary.clone()),
                    tags,
                    started,
                );
                Ok(summary)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// Derived rollup of one plan over its current period.
    pub async fn plan_summary(&self, plan_id: i64) -> Result<PlanSummary> {
        let plan = self.plan(plan_id).await?;
        let key = QueryKey::PlanSummary(plan_id);
        if let Some(CachedValue::PlanSummary(summary)) = self.cache.read().await.fresh_value(&key)
        {
            return Ok(summary.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        let range = current_period(plan.period, today());
        match self.refresh_plan_inputs(plan_id, &range).await {
            Ok(items) => {
                let summary = {
                    let store = self.store.read().await;
                    let item_refs: Vec<&PlanItem> = store.items_of_plan(plan_id);
                    let ledger: Vec<&DailyTransaction> = store.daily_transactions().collect();
                    let mut templates: Vec<&DefaultTransaction> = Vec::new();
                    for item in &item_refs {
                        templates.extend(store.defaults_of_item(item.id));
                    }
                    summarize_plan(&plan, &item_refs, &ledger, &templates, today())
                };
                let mut tags: HashSet<Tag> = HashSet::from([
                    Tag::Plan(plan_id),
                    Tag::PlanItemList(plan_id),
                    Tag::PlanSummary(plan_id),
                ]);
                for item in &items {
                    tags.insert(Tag::PlanItem(item.id));
                    tags.insert(Tag::DailyLedger(item.id));
                    tags.insert(Tag::DefaultTransactionList(item.id));
                }
                self.cache.write().await.commit(
                    key,
                    CachedValue::PlanSummary(summary.clone()),
                    tags,
                    started,
                );
                Ok(summary)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// Budgets, paginated.
    pub async fn budgets(&self, skip: u64, limit: u64) -> Result<ListResponse<Budget>> {
        let key = QueryKey::Budgets { skip, limit };
        if let Some(CachedValue::Budgets(list)) = self.cache.read().await.fresh_value(&key) {
            return Ok(list.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.list_budgets(skip, limit).await {
            Ok(list) => {
                {
                    let mut store = self.store.write().await;
                    for budget in &list.items {
                        store.upsert_budget(budget.clone());
                    }
                }
                let mut tags: HashSet<Tag> = HashSet::from([Tag::BudgetList]);
                tags.extend(list.items.iter().map(|budget| Tag::Budget(budget.id)));
                self.cache
                    .write()
                    .await
                    .commit(key, CachedValue::Budgets(list.clone()), tags, started);
                Ok(list)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// One budget's detail record.
    pub async fn budget(&self, id: i64) -> Result<Budget> {
        let key = QueryKey::Budget(id);
        if let Some(CachedValue::Budget(budget)) = self.cache.read().await.fresh_value(&key) {
            return Ok(budget.clone());
        }
        let started = self.cache.write().await.begin_refetch(&key);
        match self.service.get_budget(id).await {
            Ok(budget) => {
                self.store.write().await.upsert_budget(budget.clone());
                self.cache.write().await.commit(
                    key,
                    CachedValue::Budget(budget.clone()),
                    HashSet::from([Tag::Budget(id)]),
                    started,
                );
                Ok(budget)
            }
            Err(err) => {
                self.cache.write().await.abort_refetch(&key);
                Err(err)
            }
        }
    }

    /// Aggregates a standalone budget over the ledger slices currently in
    /// the store. A pure view; fetch ledgers first for full coverage.
    pub async fn budget_totals(&self, id: i64) -> Result<LedgerTotals> {
        let budget = self.budget(id).await?;
        let store = self.store.read().await;
        let ledger: Vec<&DailyTransaction> = store.daily_transactions().collect();
        let items: Vec<&PlanItem> = {
            // All known items; aggregate_budget resolves row direction
            let mut items: Vec<&PlanItem> = Vec::new();
            for plan in store.plans() {
                items.extend(store.items_of_plan(plan.id));
            }
            items
        };
        Ok(aggregate_budget(&budget, &ledger, &items))
    }

    async fn refresh_item_inputs(
        &self,
        plan_id: i64,
        item_id: i64,
        range: &DateRange,
    ) -> Result<PlanItem> {
        let item = self.plan_item(item_id).await?;
        let day_count = (range.end - range.start).num_days().max(0) as u64 + 1;
        self.daily_ledger(plan_id, item_id, 0, day_count).await?;
        self.default_transactions(plan_id, item_id).await?;
        Ok(item)
    }

    async fn refresh_plan_inputs(
        &self,
        plan_id: i64,
        range: &DateRange,
    ) -> Result<Vec<PlanItem>> {
        let items = self.plan_items(plan_id).await?.items;
        let day_count = (range.end - range.start).num_days().max(0) as u64 + 1;
        for item in &items {
            self.daily_ledger(plan_id, item.id, 0, day_count).await?;
            self.default_transactions(plan_id, item.id).await?;
        }
        Ok(items)
    }

    // ----- mutations -----

    /// Creates a plan after validating the draft locally.
    pub async fn create_plan(&self, draft: NewPlan) -> Result<Plan> {
        let candidate = Plan {
            id: 0,
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
        validate::validate_plan(&candidate)?;

        let plan = applied(self.service.create_plan(&draft).await?)?;
        info!("created plan {} ({})", plan.id, plan.name);
        self.store.write().await.upsert_plan(plan.clone());
        self.invalidate([Tag::PlanList]).await;
        Ok(plan)
    }

    /// Applies a partial update to a plan, optimistically.
    pub async fn update_plan(&self, id: i64, patch: PlanPatch) -> Result<Plan> {
        let current = self.plan(id).await?;
        let mut merged = current.clone();
        patch.apply(&mut merged);
        validate::validate_plan(&merged)?;

        self.store.write().await.upsert_plan(merged);
        let tags = [Tag::Plan(id), Tag::PlanList, Tag::PlanSummary(id)];
        match self.service.update_plan(id, &patch).await.and_then(applied) {
            Ok(plan) => {
                self.store.write().await.upsert_plan(plan.clone());
                self.invalidate(tags).await;
                Ok(plan)
            }
            Err(err) => {
                debug!("plan {id} update failed, rolling back: {err}");
                self.store.write().await.upsert_plan(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Toggles a plan's activation status. Invalidates both the plan detail
    /// tag and the plan-list tag.
    pub async fn set_plan_status(&self, id: i64, status: PlanStatus) -> Result<Plan> {
        let current = self.plan(id).await?;
        let mut optimistic = current.clone();
        optimistic.status = status;
        self.store.write().await.upsert_plan(optimistic);

        let tags = [Tag::Plan(id), Tag::PlanList, Tag::PlanSummary(id)];
        match self
            .service
            .set_plan_status(id, status)
            .await
            .and_then(applied)
        {
            Ok(plan) => {
                self.store.write().await.upsert_plan(plan.clone());
                self.invalidate(tags).await;
                Ok(plan)
            }
            Err(err) => {
                self.store.write().await.upsert_plan(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Deletes a plan; the store cascade mirrors the service cascade.
    pub async fn delete_plan(&self, id: i64) -> Result<()> {
        let cascade = self.store.write().await.remove_plan_cascade(id);
        let mut tags = vec![
            Tag::Plan(id),
            Tag::PlanList,
            Tag::PlanItemList(id),
            Tag::PlanSummary(id),
        ];
        if let Some(cascade) = &cascade {
            for item in &cascade.items {
                tags.push(Tag::PlanItem(item.id));
                tags.push(Tag::DailyLedger(item.id));
                tags.push(Tag::DefaultTransactionList(item.id));
            }
        }
        match self.service.delete_plan(id).await {
            Ok(()) => {
                info!("deleted plan {id}");
                {
                    let mut cache = self.cache.write().await;
                    cache.evict(&QueryKey::Plan(id));
                    cache.evict(&QueryKey::PlanItems(id));
                    cache.evict(&QueryKey::PlanSummary(id));
                }
                self.invalidate(tags).await;
                Ok(())
            }
            Err(err) => {
                if let Some(cascade) = cascade {
                    self.store.write().await.restore_plan_cascade(cascade);
                }
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Creates a plan item after validating the draft locally.
    pub async fn create_plan_item(&self, draft: NewPlanItem) -> Result<PlanItem> {
        let candidate = PlanItem {
            id: 0,
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
        validate::validate_plan_item(&candidate)?;

        let item = applied(self.service.create_plan_item(&draft).await?)?;
        self.store.write().await.upsert_plan_item(item.clone());
        self.invalidate([
            Tag::PlanItemList(item.plan_id),
            Tag::PlanSummary(item.plan_id),
        ])
        .await;
        Ok(item)
    }

    /// Applies a partial update to a plan item, optimistically.
    pub async fn update_plan_item(&self, id: i64, patch: PlanItemPatch) -> Result<PlanItem> {
        let current = self.plan_item(id).await?;
        let mut merged = current.clone();
        patch.apply(&mut merged);
        validate::validate_plan_item(&merged)?;

        self.store.write().await.upsert_plan_item(merged);
        let tags = [
            Tag::PlanItem(id),
            Tag::PlanItemList(current.plan_id),
            Tag::PlanSummary(current.plan_id),
        ];
        match self
            .service
            .update_plan_item(id, &patch)
            .await
            .and_then(applied)
        {
            Ok(item) => {
                self.store.write().await.upsert_plan_item(item.clone());
                self.invalidate(tags).await;
                Ok(item)
            }
            Err(err) => {
                self.store.write().await.upsert_plan_item(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Deletes a plan item and its ledgers.
    pub async fn delete_plan_item(&self, id: i64) -> Result<()> {
        let cascade = self.store.write().await.remove_item_cascade(id);
        let plan_id = cascade.as_ref().map(|cascade| cascade.item.plan_id);
        let mut tags = vec![
            Tag::PlanItem(id),
            Tag::DailyLedger(id),
            Tag::DefaultTransactionList(id),
        ];
        if let Some(plan_id) = plan_id {
            tags.push(Tag::PlanItemList(plan_id));
            tags.push(Tag::PlanSummary(plan_id));
        }
        match self.service.delete_plan_item(id).await {
            Ok(()) => {
                self.cache.write().await.evict(&QueryKey::PlanItem(id));
                self.invalidate(tags).await;
                Ok(())
            }
            Err(err) => {
                if let Some(cascade) = cascade {
                    self.store.write().await.restore_item_cascade(cascade);
                }
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Records a transaction against an item, dispatching the intent to the
    /// matching repository. Explicit intents may only target today's
    /// ledger; synthesized default-derived entries are never edited in
    /// place - this is the one write path for "today".
    pub async fn record_transaction(
        &self,
        plan_id: i64,
        item_id: i64,
        intent: TransactionIntent,
    ) -> Result<RecordedTransaction> {
        match intent {
            TransactionIntent::Explicit {
                date,
                label,
                amount,
            } => {
                validate::finite_amount(amount)?;
                validate::ensure_day_open(date, today())?;
                let draft = NewDailyTransaction {
                    plan_item_id: item_id,
                    category_id: None,
                    date,
                    label,
                    amount,
                };
                let txn = applied(self.service.create_daily_transaction(&draft).await?)?;
                self.store
                    .write()
                    .await
                    .upsert_daily_transaction(txn.clone());
                self.invalidate([
                    Tag::DailyLedger(item_id),
                    Tag::PlanItem(item_id),
                    Tag::PlanSummary(plan_id),
                ])
                .await;
                Ok(RecordedTransaction::Explicit(txn))
            }
            TransactionIntent::Default {
                label,
                amount,
                enabled,
            } => {
                validate::finite_amount(amount)?;
                let draft = NewDefaultTransaction {
                    plan_item_id: item_id,
                    label,
                    amount,
                    enabled,
                };
                let template = applied(self.service.create_default_transaction(&draft).await?)?;
                self.store
                    .write()
                    .await
                    .upsert_default_transaction(template.clone());
                self.invalidate([
                    Tag::DefaultTransactionList(item_id),
                    Tag::PlanItem(item_id),
                    Tag::PlanSummary(plan_id),
                ])
                .await;
                Ok(RecordedTransaction::Default(template))
            }
        }
    }

    /// Updates an explicit ledger entry. Rejected with
    /// [`Error::LedgerLocked`] unless the entry is dated today.
    pub async fn update_daily_transaction(
        &self,
        plan_id: i64,
        id: i64,
        patch: DailyTransactionPatch,
    ) -> Result<DailyTransaction> {
        if let Some(amount) = patch.amount {
            validate::finite_amount(amount)?;
        }
        let current = {
            let store = self.store.read().await;
            store
                .daily_transaction(id)
                .cloned()
                .ok_or(Error::NotFound {
                    entity: "daily transaction",
                    id,
                })?
        };
        validate::ensure_editable(&current, today())?;

        let mut merged = current.clone();
        patch.apply(&mut merged);
        self.store.write().await.upsert_daily_transaction(merged);

        let item_id = current.plan_item_id;
        let tags = [
            Tag::DailyTransaction(id),
            Tag::DailyLedger(item_id),
            Tag::PlanItem(item_id),
            Tag::PlanSummary(plan_id),
        ];
        match self
            .service
            .update_daily_transaction(id, &patch)
            .await
            .and_then(applied)
        {
            Ok(txn) => {
                self.store.write().await.upsert_daily_transaction(txn.clone());
                self.invalidate(tags).await;
                Ok(txn)
            }
            Err(err) => {
                self.store.write().await.upsert_daily_transaction(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Deletes an explicit ledger entry; the same today-only rule applies.
    pub async fn delete_daily_transaction(&self, plan_id: i64, id: i64) -> Result<()> {
        let current = {
            let store = self.store.read().await;
            store
                .daily_transaction(id)
                .cloned()
                .ok_or(Error::NotFound {
                    entity: "daily transaction",
                    id,
                })?
        };
        validate::ensure_editable(&current, today())?;

        self.store.write().await.remove_daily_transaction(id);
        let item_id = current.plan_item_id;
        let tags = [
            Tag::DailyTransaction(id),
            Tag::DailyLedger(item_id),
            Tag::PlanItem(item_id),
            Tag::PlanSummary(plan_id),
        ];
        match self.service.delete_daily_transaction(id).await {
            Ok(()) => {
                self.invalidate(tags).await;
                Ok(())
            }
            Err(err) => {
                self.store.write().await.upsert_daily_transaction(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Updates a recurring template, optimistically.
    pub async fn update_default_transaction(
        &self,
        plan_id: i64,
        id: i64,
        patch: DefaultTransactionPatch,
    ) -> Result<DefaultTransaction> {
        if let Some(amount) = patch.amount {
            validate::finite_amount(amount)?;
        }
        let current = {
            let store = self.store.read().await;
            store
                .default_transaction(id)
                .cloned()
                .ok_or(Error::NotFound {
                    entity: "default transaction",
                    id,
                })?
        };
        let mut merged = current.clone();
        patch.apply(&mut merged);
        self.store.write().await.upsert_default_transaction(merged);

        let item_id = current.plan_item_id;
        let tags = [
            Tag::DefaultTransaction(id),
            Tag::DefaultTransactionList(item_id),
            Tag::PlanItem(item_id),
            Tag::PlanSummary(plan_id),
        ];
        match self
            .service
            .update_default_transaction(id, &patch)
            .await
            .and_then(applied)
        {
            Ok(template) => {
                self.store
                    .write()
                    .await
                    .upsert_default_transaction(template.clone());
                self.invalidate(tags).await;
                Ok(template)
            }
            Err(err) => {
                self.store
                    .write()
                    .await
                    .upsert_default_transaction(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Deletes a recurring template.
    pub async fn delete_default_transaction(&self, plan_id: i64, id: i64) -> Result<()> {
        let current = {
            let store = self.store.read().await;
            store
                .default_transaction(id)
                .cloned()
                .ok_or(Error::NotFound {
                    entity: "default transaction",
                    id,
                })?
        };
        self.store.write().await.remove_default_transaction(id);
        let item_id = current.plan_item_id;
        let tags = [
            Tag::DefaultTransaction(id),
            Tag::DefaultTransactionList(item_id),
            Tag::PlanItem(item_id),
            Tag::PlanSummary(plan_id),
        ];
        match self.service.delete_default_transaction(id).await {
            Ok(()) => {
                self.invalidate(tags).await;
                Ok(())
            }
            Err(err) => {
                self.store
                    .write()
                    .await
                    .upsert_default_transaction(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Creates a standalone budget.
    pub async fn create_budget(&self, draft: NewBudget) -> Result<Budget> {
        validate::finite_amount(draft.amount)?;
        let budget = applied(self.service.create_budget(&draft).await?)?;
        self.store.write().await.upsert_budget(budget.clone());
        self.invalidate([Tag::BudgetList]).await;
        Ok(budget)
    }

    /// Applies a partial update to a budget, optimistically.
    pub async fn update_budget(&self, id: i64, patch: BudgetPatch) -> Result<Budget> {
        if let Some(amount) = patch.amount {
            validate::finite_amount(amount)?;
        }
        let current = self.budget(id).await?;
        let mut merged = current.clone();
        patch.apply(&mut merged);
        self.store.write().await.upsert_budget(merged);

        let tags = [Tag::Budget(id), Tag::BudgetList];
        match self.service.update_budget(id, &patch).await.and_then(applied) {
            Ok(budget) => {
                self.store.write().await.upsert_budget(budget.clone());
                self.invalidate(tags).await;
                Ok(budget)
            }
            Err(err) => {
                self.store.write().await.upsert_budget(current);
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }

    /// Deletes a budget.
    pub async fn delete_budget(&self, id: i64) -> Result<()> {
        let removed = self.store.write().await.remove_budget(id);
        let tags = [Tag::Budget(id), Tag::BudgetList];
        match self.service.delete_budget(id).await {
            Ok(()) => {
                self.cache.write().await.evict(&QueryKey::Budget(id));
                self.invalidate(tags).await;
                Ok(())
            }
            Err(err) => {
                if let Some(budget) = removed {
                    self.store.write().await.upsert_budget(budget);
                }
                self.invalidate(tags).await;
                Err(err)
            }
        }
    }
}
