//! Threshold classification - maps a spending percentage to a status tier.
//!
//! Warn levels are margins *on top of* 100%: with a red level of 80 the
//! danger tier starts at 180% of budget, and sitting exactly on 100% is
//! still `safe`. Comparisons run on basis points (hundredths of a percent,
//! pre-rounded) so floating error can never flap a value between tiers.

use serde::{Deserialize, Serialize};

/// Status tier of a budget line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// At or under budget, or under the yellow margin over it
    Safe,
    /// Between the yellow and red margins over budget
    Warning,
    /// At or over the red margin over budget
    Danger,
}

/// Percentage of budget spent. Defined as 0 when the target is not
/// positive, so a zero-amount budget never produces a division error.
#[must_use]
pub fn percentage(target_amount: f64, spent: f64) -> f64 {
    if target_amount > 0.0 {
        (spent / target_amount) * 100.0
    } else {
        0.0
    }
}

/// Percentage in whole basis points. All tier comparisons use this so that
/// a value landing exactly on a boundary classifies deterministically.
fn percentage_basis_points(target_amount: f64, spent: f64) -> i64 {
    if target_amount > 0.0 {
        ((spent / target_amount) * 10_000.0).round() as i64
    } else {
        0
    }
}

fn margin_basis_points(warn_level: f64) -> i64 {
    ((100.0 + warn_level) * 100.0).round() as i64
}

/// Classifies spending against a target.
///
/// `danger` iff the percentage is at or above `100 + warn_level_red`;
/// `warning` iff it is at or above `100 + warn_level_yellow` but below the
/// red bound. Lower bounds are inclusive, upper bounds exclusive.
#[must_use]
pub fn classify(
    target_amount: f64,
    spent: f64,
    warn_level_yellow: f64,
    warn_level_red: f64,
) -> BudgetStatus {
    let pct = percentage_basis_points(target_amount, spent);
    if pct >= margin_basis_points(warn_level_red) {
        BudgetStatus::Danger
    } else if pct >= margin_basis_points(warn_level_yellow) {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Safe
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_warn_band_classification() {
        // 170% with yellow at +50 and red at +80 sits in the warning band
        assert_eq!(classify(1000.0, 1700.0, 50.0, 80.0), BudgetStatus::Warning);
        // 185% crosses the red bound
        assert_eq!(classify(1000.0, 1850.0, 50.0, 80.0), BudgetStatus::Danger);
        // 140% is below the yellow bound
        assert_eq!(classify(1000.0, 1400.0, 50.0, 80.0), BudgetStatus::Safe);
    }

    #[test]
    fn test_exactly_full_budget_is_safe() {
        assert_eq!(classify(1000.0, 1000.0, 50.0, 80.0), BudgetStatus::Safe);
    }

    #[test]
    fn test_boundaries_are_lower_inclusive() {
        // Exactly on the red bound is danger, never warning
        assert_eq!(classify(1000.0, 1800.0, 50.0, 80.0), BudgetStatus::Danger);
        // Exactly on the yellow bound is warning
        assert_eq!(classify(1000.0, 1500.0, 50.0, 80.0), BudgetStatus::Warning);
        // One cent under the red bound stays warning
        assert_eq!(classify(1000.0, 1799.9, 50.0, 80.0), BudgetStatus::Warning);
    }

    #[test]
    fn test_zero_target_is_safe_with_zero_percentage() {
        assert_eq!(percentage(0.0, 500.0), 0.0);
        assert_eq!(classify(0.0, 500.0, 50.0, 80.0), BudgetStatus::Safe);
        // Negative targets follow the same convention
        assert_eq!(classify(-100.0, 500.0, 50.0, 80.0), BudgetStatus::Safe);
    }

    #[test]
    fn test_monotonic_in_spent() {
        let mut last = BudgetStatus::Safe;
        let rank = |status: BudgetStatus| match status {
            BudgetStatus::Safe => 0,
            BudgetStatus::Warning => 1,
            BudgetStatus::Danger => 2,
        };
        for cents in 0..4000 {
            let spent = f64::from(cents);
            let status = classify(2000.0, spent, 50.0, 80.0);
            assert!(
                rank(status) >= rank(last),
                "classification regressed at spent={spent}"
            );
            last = status;
        }
    }

    #[test]
    fn test_boundary_does_not_flap_from_floating_error() {
        // 14.999999999999998 / 10.0 computes to 149.99999999999998%, an
        // epsilon under the red bound. Pre-rounded basis points snap it to
        // exactly 150.00%, so the value classifies danger instead of
        // flapping with the error term.
        let spent = 14.999_999_999_999_998;
        assert_eq!(classify(10.0, spent, 20.0, 50.0), BudgetStatus::Danger);
        // A value a whole cent under the bound still stays warning
        assert_eq!(classify(10.0, 14.99, 20.0, 50.0), BudgetStatus::Warning);
    }

    #[test]
    fn test_overspend_percentage_sign() {
        assert_eq!(percentage(1000.0, 1700.0), 170.0);
        assert_eq!(percentage(1000.0, -200.0), -20.0);
    }
}
