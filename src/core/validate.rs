//! Field-level validation and the ledger edit capability.
//!
//! Validation runs before any remote call, so a rejected mutation never
//! leaves the process. The checks mirror the service's own rules; what the
//! service would reject, the engine rejects first with a field-level error.

use chrono::NaiveDate;

use crate::entities::{DailyTransaction, EditState, ExcludeKind, ItemKind, Plan, PlanItem};
use crate::errors::{Error, Result};

/// Rejects non-finite amounts before they can reach an aggregate.
pub fn finite_amount(amount: f64) -> Result<()> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Validates the warn-level pair: both margins in [0, 100] and strictly
/// ordered yellow below red.
pub fn validate_warn_levels(warn_level_yellow: f64, warn_level_red: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&warn_level_yellow) {
        return Err(Error::Validation {
            field: "warnLevelYellow",
            message: format!("must be within [0, 100], got {warn_level_yellow}"),
        });
    }
    if !(0.0..=100.0).contains(&warn_level_red) {
        return Err(Error::Validation {
            field: "warnLevelRed",
            message: format!("must be within [0, 100], got {warn_level_red}"),
        });
    }
    if warn_level_yellow >= warn_level_red {
        return Err(Error::Validation {
            field: "warnLevelYellow",
            message: format!(
                "must be below warnLevelRed ({warn_level_yellow} >= {warn_level_red})"
            ),
        });
    }
    Ok(())
}

/// Validates a plan as it would exist after a create or patch.
pub fn validate_plan(plan: &Plan) -> Result<()> {
    if plan.name.trim().is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "plan name cannot be empty".to_string(),
        });
    }
    validate_warn_levels(plan.warn_level_yellow, plan.warn_level_red)?;
    if !(0.0..=100.0).contains(&plan.daily_min_limit) {
        return Err(Error::Validation {
            field: "dailyMinLimit",
            message: format!("must be within [0, 100], got {}", plan.daily_min_limit),
        });
    }
    Ok(())
}

/// Validates a plan item as it would exist after a create or patch.
///
/// `minimum_percentage` is required exactly when the item is a FLEXIBLE
/// expense and must be absent otherwise.
pub fn validate_plan_item(item: &PlanItem) -> Result<()> {
    if item.name.trim().is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "item name cannot be empty".to_string(),
        });
    }
    finite_amount(item.amount)?;
    if item.amount < 0.0 {
        return Err(Error::Validation {
            field: "amount",
            message: format!("budget target cannot be negative, got {}", item.amount),
        });
    }

    let flexible_expense =
        item.kind == ItemKind::Expense && item.exclude_kind == ExcludeKind::Flexible;
    match item.minimum_percentage {
        None if flexible_expense => Err(Error::Validation {
            field: "minimumPercentage",
            message: "required for a flexible expense item".to_string(),
        }),
        Some(_) if !flexible_expense => Err(Error::Validation {
            field: "minimumPercentage",
            message: "only allowed on a flexible expense item".to_string(),
        }),
        Some(minimum) if !(0.0..=100.0).contains(&minimum) => Err(Error::Validation {
            field: "minimumPercentage",
            message: format!("must be within [0, 100], got {minimum}"),
        }),
        _ => Ok(()),
    }
}

/// Capability check consulted by every ledger mutation: only entries dated
/// today may change.
pub fn ensure_editable(txn: &DailyTransaction, today: NaiveDate) -> Result<()> {
    match txn.edit_state(today) {
        EditState::Editable => Ok(()),
        EditState::Locked => Err(Error::LedgerLocked { date: txn.date }),
    }
}

/// The create-side twin of [`ensure_editable`]: new explicit entries may
/// only be written into today's ledger.
pub fn ensure_day_open(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date == today {
        Ok(())
    } else {
        Err(Error::LedgerLocked { date })
    }
}
