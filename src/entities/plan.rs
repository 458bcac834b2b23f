//! Plan entity - the top-level budgeting unit.
//!
//! A plan owns a set of [`super::PlanItem`] lines, carries the calendar
//! period its budgets are tracked over, and the warning thresholds that
//! drive status classification. Thresholds are *excess-over-budget* margins:
//! a red level of 80 means the danger tier starts at 180% of budget.

use serde::{Deserialize, Serialize};

/// Calendar period a plan's budgets are tracked over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanPeriod {
    /// Budgets reset every day
    Daily,
    /// Budgets tracked Monday through Sunday
    Weekly,
    /// Budgets tracked over the calendar month
    Monthly,
    /// Budgets tracked over the calendar year
    Yearly,
}

/// Activation state, toggled without touching any other plan field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    /// Plan is live and shown to the user
    Active,
    /// Soft-deactivated; data is preserved
    Inactive,
}

/// Plan record as served by the remote data service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Unique identifier
    pub id: i64,
    /// Human-readable name of the plan
    pub name: String,
    /// ISO currency code, display-only (no conversion happens client-side)
    pub currency: String,
    /// Period the plan's budgets are tracked over
    #[serde(rename = "planType")]
    pub period: PlanPeriod,
    /// Whether the plan re-creates itself at the end of each period
    pub auto_repeat: bool,
    /// Whether flexible budgets are auto-adjusted by the service
    pub auto_adjust_enabled: bool,
    /// Advisory lower bound (percent) for daily spending, display-only
    pub daily_min_limit: f64,
    /// Percent over 100% at which items turn `warning`
    pub warn_level_yellow: f64,
    /// Percent over 100% at which items turn `danger`.
    /// Invariant: `warn_level_yellow < warn_level_red`, both in [0, 100].
    pub warn_level_red: f64,
    /// Activation state
    pub status: PlanStatus,
}

impl Plan {
    /// Whether the plan is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let plan = Plan {
            id: 1,
            name: "Household".to_string(),
            currency: "EUR".to_string(),
            period: PlanPeriod::Monthly,
            auto_repeat: true,
            auto_adjust_enabled: false,
            daily_min_limit: 10.0,
            warn_level_yellow: 50.0,
            warn_level_red: 80.0,
            status: PlanStatus::Active,
        };

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["planType"], "monthly");
        assert_eq!(json["warnLevelYellow"], 50.0);
        assert_eq!(json["status"], "ACTIVE");
        // Rust-side names must not leak onto the wire
        assert!(json.get("warn_level_yellow").is_none());
    }

    #[test]
    fn test_status_round_trip() {
        let parsed: PlanStatus = serde_json::from_str("\"INACTIVE\"").unwrap();
        assert_eq!(parsed, PlanStatus::Inactive);
    }
}
