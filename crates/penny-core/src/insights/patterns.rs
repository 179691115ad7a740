//! Pattern Analyzer - descriptive spending breakdowns

use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{round2, Transaction};

use super::engine::{AnalysisContext, Insight};
use super::stats::{finite_or_zero, mean};
use super::types::{Finding, InsightType, Severity};

/// Weekend mean must exceed the weekday mean by this factor to be reported
const WEEKEND_SKEW_FACTOR: f64 = 1.2;

/// Mean spend on one day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdaySpending {
    pub weekday: String,
    pub mean: f64,
    pub count: usize,
}

/// Per-category totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub total: f64,
    pub mean: f64,
    pub count: usize,
}

/// Descriptive breakdown of a ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendingPatterns {
    /// Monday first; days with no transactions are left out
    pub by_weekday: Vec<WeekdaySpending>,
    pub by_category: BTreeMap<String, CategoryStats>,
    /// Mean amount on Saturdays and Sundays (0 if none)
    pub weekend_mean: f64,
    /// Mean amount Monday to Friday (0 if none)
    pub weekday_mean: f64,
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Group means; every mean is finite, empty groups report 0
pub fn analyze_patterns(ledger: &[Transaction]) -> SpendingPatterns {
    let usable: Vec<&Transaction> = ledger.iter().filter(|tx| tx.is_usable()).collect();

    let mut days: [Vec<f64>; 7] = Default::default();
    let mut categories: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut weekend = Vec::new();
    let mut weekday = Vec::new();

    for tx in &usable {
        let day = tx.date.weekday();
        days[day.num_days_from_monday() as usize].push(tx.amount);
        categories
            .entry(tx.category.clone())
            .or_default()
            .push(tx.amount);

        if is_weekend(day) {
            weekend.push(tx.amount);
        } else {
            weekday.push(tx.amount);
        }
    }

    let mut by_weekday = Vec::new();
    let mut day = Weekday::Mon;
    for amounts in &days {
        if !amounts.is_empty() {
            by_weekday.push(WeekdaySpending {
                weekday: weekday_name(day).to_string(),
                mean: round2(finite_or_zero(mean(amounts).unwrap_or(0.0))),
                count: amounts.len(),
            });
        }
        day = day.succ();
    }

    let by_category = categories
        .into_iter()
        .map(|(category, amounts)| {
            let total: f64 = amounts.iter().sum();
            let stats = CategoryStats {
                total: round2(finite_or_zero(total)),
                mean: round2(finite_or_zero(mean(&amounts).unwrap_or(0.0))),
                count: amounts.len(),
            };
            (category, stats)
        })
        .collect();

    SpendingPatterns {
        by_weekday,
        by_category,
        weekend_mean: round2(finite_or_zero(mean(&weekend).unwrap_or(0.0))),
        weekday_mean: round2(finite_or_zero(mean(&weekday).unwrap_or(0.0))),
    }
}

/// Reports weekend-heavy spending
pub struct PatternInsight;

impl PatternInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for PatternInsight {
    fn id(&self) -> InsightType {
        InsightType::SpendingPattern
    }

    fn name(&self) -> &'static str {
        "Pattern Analyzer"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
        let patterns = analyze_patterns(ctx.ledger);

        if patterns.weekend_mean <= 0.0
            || patterns.weekday_mean <= 0.0
            || patterns.weekend_mean <= patterns.weekday_mean * WEEKEND_SKEW_FACTOR
        {
            return Ok(vec![]);
        }

        let ratio = patterns.weekend_mean / patterns.weekday_mean;
        let finding = Finding::new(
            InsightType::SpendingPattern,
            "pattern:weekend",
            Severity::Info,
            "Weekend Spending",
            format!(
                "You spend {:.2} per transaction on weekends vs {:.2} on weekdays ({:.1}x)",
                patterns.weekend_mean, patterns.weekday_mean, ratio
            ),
        )
        .with_data(serde_json::to_value(&patterns)?);

        Ok(vec![finding])
    }
}
