//! Budget Monitor
//!
//! Compares this month's spending against the monthly budget and projects
//! the month-end total from the daily run rate. Months are treated as
//! 30 days for the projection regardless of their real length.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{round2, Transaction};

use super::engine::{AnalysisContext, Insight};
use super::forecast::YearMonth;
use super::stats::finite_or_zero;
use super::types::{Finding, InsightType, Severity};

/// Days assumed per month when projecting the month-end total
pub const PROJECTION_DAYS: f64 = 30.0;

/// Percentage above which usage counts as high
pub const HIGH_USAGE_PERCENT: f64 = 80.0;

/// Percentage above which spending is merely "on track" rather than excellent
pub const ON_TRACK_PERCENT: f64 = 50.0;

/// Budget classification, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
    /// Already spent more than the budget
    Exceeded,
    /// On pace to spend more than the budget by month end
    ProjectedToExceed,
    /// More than 80% used
    HighUsage,
    /// More than 50% used
    OnTrack,
    /// Half or less used
    Excellent,
}

impl BudgetLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetLevel::Exceeded => "exceeded",
            BudgetLevel::ProjectedToExceed => "projected_to_exceed",
            BudgetLevel::HighUsage => "high_usage",
            BudgetLevel::OnTrack => "on_track",
            BudgetLevel::Excellent => "excellent",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BudgetLevel::Exceeded => Severity::Alert,
            BudgetLevel::ProjectedToExceed => Severity::Warning,
            BudgetLevel::HighUsage => Severity::Attention,
            BudgetLevel::OnTrack | BudgetLevel::Excellent => Severity::Info,
        }
    }
}

impl fmt::Display for BudgetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the current month stands against the budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub period: YearMonth,
    pub budget: f64,
    /// Spent so far this month
    pub current_total: f64,
    /// Percentage of the budget used (0 when the budget is not positive)
    pub percentage: f64,
    /// Month-end total at the current daily rate
    pub projected_total: f64,
    pub level: BudgetLevel,
    /// Human-readable summary carrying the relevant numbers
    pub message: String,
}

/// Evaluate the month containing `today`
///
/// A zero, negative or non-finite budget is treated as 0: the percentage is
/// reported as 0 and any spending at all counts as exceeding it.
pub fn budget_status(ledger: &[Transaction], monthly_budget: f64, today: NaiveDate) -> BudgetStatus {
    let budget = if monthly_budget.is_finite() && monthly_budget > 0.0 {
        monthly_budget
    } else {
        0.0
    };
    let period = YearMonth::of(today);

    let current_total: f64 = ledger
        .iter()
        .filter(|tx| tx.is_usable() && period.contains(tx.date))
        .map(|tx| tx.amount)
        .sum();

    let percentage = if budget > 0.0 {
        finite_or_zero(100.0 * current_total / budget)
    } else {
        0.0
    };

    let day = today.day();
    let daily_average = if day > 0 {
        current_total / day as f64
    } else {
        0.0
    };
    let projected_total = daily_average * PROJECTION_DAYS;

    let level = if current_total > budget {
        BudgetLevel::Exceeded
    } else if projected_total > budget {
        BudgetLevel::ProjectedToExceed
    } else if percentage > HIGH_USAGE_PERCENT {
        BudgetLevel::HighUsage
    } else if percentage > ON_TRACK_PERCENT {
        BudgetLevel::OnTrack
    } else {
        BudgetLevel::Excellent
    };

    let message = match level {
        BudgetLevel::Exceeded => format!(
            "Budget exceeded! Spent {:.2} of {:.2} ({:.1}%)",
            current_total, budget, percentage
        ),
        BudgetLevel::ProjectedToExceed => format!(
            "Projected to exceed budget: on pace for {:.2} of {:.2} (spent {:.2} so far)",
            projected_total, budget, current_total
        ),
        BudgetLevel::HighUsage => format!(
            "High usage: {:.1}% of budget used ({:.2} of {:.2})",
            percentage, current_total, budget
        ),
        BudgetLevel::OnTrack => format!(
            "On track: {:.1}% of budget used ({:.2} of {:.2})",
            percentage, current_total, budget
        ),
        BudgetLevel::Excellent => format!(
            "Excellent: only {:.1}% of budget used ({:.2} of {:.2})",
            percentage, current_total, budget
        ),
    };

    BudgetStatus {
        period,
        budget,
        current_total: round2(current_total),
        percentage,
        projected_total: round2(projected_total),
        level,
        message,
    }
}

/// `budget_status` for the local wall-clock day
pub fn budget_status_now(ledger: &[Transaction], monthly_budget: f64) -> BudgetStatus {
    budget_status(ledger, monthly_budget, chrono::Local::now().date_naive())
}

/// Insight wrapper around the budget monitor
pub struct BudgetInsight;

impl BudgetInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BudgetInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for BudgetInsight {
    fn id(&self) -> InsightType {
        InsightType::BudgetStatus
    }

    fn name(&self) -> &'static str {
        "Budget Monitor"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
        let status = budget_status(ctx.ledger, ctx.monthly_budget, ctx.today);

        let title = match status.level {
            BudgetLevel::Exceeded => "Budget Exceeded",
            BudgetLevel::ProjectedToExceed => "Budget At Risk",
            BudgetLevel::HighUsage => "High Budget Usage",
            BudgetLevel::OnTrack | BudgetLevel::Excellent => "Budget Status",
        };

        let finding = Finding::new(
            InsightType::BudgetStatus,
            format!("budget:{}", status.period),
            status.level.severity(),
            title,
            status.message.clone(),
        )
        .with_data(serde_json::to_value(&status)?);

        Ok(vec![finding])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(d: NaiveDate, amount: f64) -> Transaction {
        Transaction::new(d, "Food", amount, "")
    }

    #[test]
    fn test_no_spending_is_excellent() {
        let today = date(2024, 6, 15);
        for budget in [1.0, 100.0, 1_000_000.0] {
            let status = budget_status(&[], budget, today);
            assert_eq!(status.percentage, 0.0);
            assert_eq!(status.level, BudgetLevel::Excellent);
        }
    }

    #[test]
    fn test_only_current_month_counts() {
        // Twelve months of 100 each, none in the current month
        let ledger: Vec<Transaction> = (1..=12).map(|m| tx(date(2023, m, 10), 100.0)).collect();
        let status = budget_status(&ledger, 5000.0, date(2024, 6, 15));

        assert_eq!(status.current_total, 0.0);
        assert_eq!(status.percentage, 0.0);
        assert_eq!(status.level, BudgetLevel::Excellent);
    }

    #[test]
    fn test_exceeded() {
        let today = date(2024, 6, 28);
        let ledger = vec![tx(date(2024, 6, 1), 600.0), tx(date(2024, 6, 2), 500.0)];
        let status = budget_status(&ledger, 1000.0, today);

        assert_eq!(status.level, BudgetLevel::Exceeded);
        assert_eq!(status.current_total, 1100.0);
        assert!((status.percentage - 110.0).abs() < 1e-9);
        assert!(status.message.contains("1100.00"));
    }

    #[test]
    fn test_projected_to_exceed() {
        // 400 by day 10 -> 40/day -> 1200 projected
        let ledger = vec![tx(date(2024, 6, 5), 400.0)];
        let status = budget_status(&ledger, 1000.0, date(2024, 6, 10));

        assert_eq!(status.level, BudgetLevel::ProjectedToExceed);
        assert_eq!(status.projected_total, 1200.0);
    }

    #[test]
    fn test_high_usage_and_on_track() {
        // Late in the month the projection stays under budget
        let today = date(2024, 6, 30);
        let status = budget_status(&[tx(today, 850.0)], 1000.0, today);
        assert_eq!(status.level, BudgetLevel::HighUsage);

        let status = budget_status(&[tx(today, 600.0)], 1000.0, today);
        assert_eq!(status.level, BudgetLevel::OnTrack);

        let status = budget_status(&[tx(today, 500.0)], 1000.0, today);
        assert_eq!(status.level, BudgetLevel::Excellent);
    }

    #[test]
    fn test_exceeded_wins_over_projection() {
        let today = date(2024, 6, 1);
        let status = budget_status(&[tx(today, 1500.0)], 1000.0, today);
        assert_eq!(status.level, BudgetLevel::Exceeded);
    }

    #[test]
    fn test_zero_budget_guard() {
        let today = date(2024, 6, 20);
        let status = budget_status(&[tx(today, 10.0)], 0.0, today);
        assert_eq!(status.percentage, 0.0);
        assert_eq!(status.level, BudgetLevel::Exceeded);

        let status = budget_status(&[], -50.0, today);
        assert_eq!(status.percentage, 0.0);
        assert_eq!(status.level, BudgetLevel::Excellent);
    }

    #[test]
    fn test_budget_insight_severity() {
        let today = date(2024, 6, 28);
        let ledger = vec![tx(today, 2000.0)];
        let ctx = AnalysisContext::new(&ledger, 1000.0, today);
        let findings = BudgetInsight::new().analyze(&ctx).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Alert);
        assert_eq!(findings[0].key, "budget:2024-06");
        assert_eq!(findings[0].data["level"], "exceeded");
    }
}
