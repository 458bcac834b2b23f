//! Shared test utilities for planbook.
//!
//! This module provides fixture builders with sensible defaults and helpers
//! for setting up an engine over the in-memory data service.

use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

use crate::api::memory::InMemoryDataService;
use crate::api::types::NewPlan;
use crate::client::Planner;
use crate::entities::{
    Budget, DailyTransaction, DefaultTransaction, ExcludeKind, ItemKind, Plan, PlanItem,
    PlanPeriod, PlanStatus,
};
use crate::errors::Result;

/// Initializes tracing for a test, honoring `RUST_LOG` when set.
/// Safe to call from every test; only the first call wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Shorthand date constructor for fixtures.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A monthly plan with warn levels 50/80.
pub fn plan_fixture(id: i64) -> Plan {
    Plan {
        id,
        name: format!("Plan {id}"),
        currency: "EUR".to_string(),
        period: PlanPeriod::Monthly,
        auto_repeat: false,
        auto_adjust_enabled: false,
        daily_min_limit: 10.0,
        warn_level_yellow: 50.0,
        warn_level_red: 80.0,
        status: PlanStatus::Active,
    }
}

/// An expense item; flexible items get a minimum percentage, per the
/// validation invariant.
pub fn expense_item(id: i64, plan_id: i64, exclude_kind: ExcludeKind, amount: f64) -> PlanItem {
    PlanItem {
        id,
        plan_id,
        name: format!("Expense {id}"),
        kind: ItemKind::Expense,
        exclude_kind,
        amount,
        spent_amount: 0.0,
        saved_amount: 0.0,
        average_daily: 0.0,
        minimum_percentage: (exclude_kind == ExcludeKind::Flexible).then_some(10.0),
    }
}

/// An income item.
pub fn income_item(id: i64, plan_id: i64, amount: f64) -> PlanItem {
    PlanItem {
        id,
        plan_id,
        name: format!("Income {id}"),
        kind: ItemKind::Income,
        exclude_kind: ExcludeKind::Fixed,
        amount,
        spent_amount: 0.0,
        saved_amount: 0.0,
        average_daily: 0.0,
        minimum_percentage: None,
    }
}

/// An explicit ledger entry without a category.
pub fn txn(id: i64, plan_item_id: i64, date: NaiveDate, amount: f64) -> DailyTransaction {
    DailyTransaction {
        id,
        plan_item_id,
        category_id: None,
        date,
        label: format!("Entry {id}"),
        amount,
    }
}

/// An explicit ledger entry tied to a budget category.
pub fn txn_in_category(
    id: i64,
    plan_item_id: i64,
    category_id: i64,
    date: NaiveDate,
    amount: f64,
) -> DailyTransaction {
    DailyTransaction {
        category_id: Some(category_id),
        ..txn(id, plan_item_id, date, amount)
    }
}

/// A recurring template.
pub fn default_txn(id: i64, plan_item_id: i64, amount: f64, enabled: bool) -> DefaultTransaction {
    DefaultTransaction {
        id,
        plan_item_id,
        label: format!("Template {id}"),
        amount,
        enabled,
    }
}

/// A standalone budget over an explicit window.
pub fn budget_fixture(
    id: i64,
    category_id: i64,
    amount: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Budget {
    Budget {
        id,
        category_id,
        amount,
        start_date,
        end_date,
        period: PlanPeriod::Monthly,
    }
}

/// A plan creation draft with the fixture warn levels.
pub fn plan_draft(name: &str) -> NewPlan {
    NewPlan {
        name: name.to_string(),
        currency: "EUR".to_string(),
        period: PlanPeriod::Monthly,
        auto_repeat: false,
        auto_adjust_enabled: false,
        daily_min_limit: 10.0,
        warn_level_yellow: 50.0,
        warn_level_red: 80.0,
    }
}

/// An engine over an empty in-memory service.
pub fn setup_planner() -> Planner<InMemoryDataService> {
    Planner::new(InMemoryDataService::new())
}

/// An engine seeded with plan 1. Returns (planner, plan).
pub async fn setup_with_plan() -> Result<(Planner<InMemoryDataService>, Plan)> {
    let planner = setup_planner();
    let plan = plan_fixture(1);
    planner.service().seed_plan(plan.clone()).await;
    Ok((planner, plan))
}

/// An engine seeded with plan 1 and a flexible expense item 10.
/// Returns (planner, plan, item).
pub async fn setup_with_item() -> Result<(Planner<InMemoryDataService>, Plan, PlanItem)> {
    let (planner, plan) = setup_with_plan().await?;
    let item = expense_item(10, plan.id, ExcludeKind::Flexible, 1000.0);
    planner.service().seed_plan_item(item.clone()).await;
    Ok((planner, plan, item))
}
