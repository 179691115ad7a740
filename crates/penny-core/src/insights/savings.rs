//! Savings Potential
//!
//! Any category taking more than 30% of total spend gets a suggested 15% cut.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{round2, Transaction};

use super::engine::{AnalysisContext, Insight};
use super::summary::category_totals;
use super::types::{Finding, InsightType, Severity};

/// Share of total spend (percent) a category must exceed to be reported
pub const SHARE_THRESHOLD_PERCENT: f64 = 30.0;

/// Suggested reduction as a fraction of the category total
pub const SUGGESTED_CUT: f64 = 0.15;

/// A category where cutting back would matter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsOpportunity {
    pub category: String,
    pub current_amount: f64,
    /// Percentage of total spend
    pub share_percent: f64,
    pub suggested_savings: f64,
}

/// Opportunities sorted by suggested savings, largest first
pub fn savings_opportunities(ledger: &[Transaction]) -> Vec<SavingsOpportunity> {
    let totals = category_totals(ledger);
    let spent: f64 = totals.values().sum();
    if !spent.is_finite() || spent <= 0.0 {
        return Vec::new();
    }

    let mut opportunities: Vec<SavingsOpportunity> = totals
        .into_iter()
        .filter_map(|(category, amount)| {
            let share = 100.0 * amount / spent;
            (share > SHARE_THRESHOLD_PERCENT).then(|| SavingsOpportunity {
                category,
                current_amount: round2(amount),
                share_percent: round2(share),
                suggested_savings: round2(amount * SUGGESTED_CUT),
            })
        })
        .collect();

    opportunities.sort_by(|a, b| {
        b.suggested_savings
            .total_cmp(&a.suggested_savings)
            .then_with(|| a.category.cmp(&b.category))
    });
    opportunities
}

/// Insight wrapper around the savings calculation
pub struct SavingsInsight;

impl SavingsInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SavingsInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for SavingsInsight {
    fn id(&self) -> InsightType {
        InsightType::SavingsOpportunity
    }

    fn name(&self) -> &'static str {
        "Savings Potential"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = vec![];

        for opp in savings_opportunities(ctx.ledger) {
            let finding = Finding::new(
                InsightType::SavingsOpportunity,
                format!("savings:{}", opp.category.to_lowercase()),
                Severity::Attention,
                format!("Reduce {} Spending", opp.category),
                format!(
                    "{} is {:.1}% of your spending; a 15% cut would save {:.2}",
                    opp.category, opp.share_percent, opp.suggested_savings
                ),
            )
            .with_data(serde_json::to_value(&opp)?);
            findings.push(finding);
        }

        Ok(findings)
    }
}
