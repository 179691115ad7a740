//! Monthly forecast
//!
//! Rolls a ledger up into calendar months, fits a regression over the monthly
//! totals and predicts next month's spend with a 95% interval.
//!
//! Features per month: sequential index, transaction count, mean amount,
//! standard deviation of amounts (0 for single-transaction months) and the
//! month-of-year number. See `regression` for the model selection rule.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{round2, Transaction};

use super::engine::{AnalysisContext, Insight};
use super::regression::{FeatureRow, FittedModel, ModelKind};
use super::stats::{mean, population_std_dev, sample_std_dev};
use super::types::{Finding, InsightType, Severity};

/// z value for a two-sided 95% interval
const Z_95: f64 = 1.96;

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The following calendar month
    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One row of the monthly rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub period: YearMonth,
    pub total: f64,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation of amounts; 0 when the month has one transaction
    pub std_dev: f64,
}

/// 95% prediction band around the forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Next-month prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Month being predicted (the one after the last month with data)
    pub period: YearMonth,
    /// Predicted total, never negative
    pub amount: f64,
    pub interval: ConfidenceInterval,
    pub model: ModelKind,
}

/// Monthly table plus (when there is enough history) a prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub monthly: Vec<MonthlyAggregate>,
    pub prediction: Option<Forecast>,
}

impl ForecastResult {
    /// True when the ledger had nothing to aggregate
    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }
}

/// Group usable transactions by calendar month, oldest first
pub fn monthly_aggregates(ledger: &[Transaction]) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
    for tx in ledger.iter().filter(|tx| tx.is_usable()) {
        months.entry(YearMonth::of(tx.date)).or_default().push(tx.amount);
    }

    months
        .into_iter()
        .map(|(period, amounts)| MonthlyAggregate {
            period,
            total: round2(amounts.iter().sum()),
            count: amounts.len(),
            mean: mean(&amounts).unwrap_or(0.0),
            std_dev: sample_std_dev(&amounts).unwrap_or(0.0),
        })
        .collect()
}

/// Predict next month's spend
///
/// Never fails: an empty ledger gives an empty result, a single month gives
/// the table without a prediction, and any internal failure is logged and
/// reported as an empty result.
pub fn forecast_next_month(ledger: &[Transaction]) -> ForecastResult {
    match try_forecast(ledger) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Monthly forecast failed");
            ForecastResult::default()
        }
    }
}

fn features(index: usize, month: &MonthlyAggregate) -> FeatureRow {
    [
        index as f64,
        month.count as f64,
        month.mean,
        month.std_dev,
        month.period.month as f64,
    ]
}

fn try_forecast(ledger: &[Transaction]) -> Result<ForecastResult> {
    let monthly = monthly_aggregates(ledger);
    if monthly.len() < 2 {
        return Ok(ForecastResult {
            monthly,
            prediction: None,
        });
    }

    let x: Vec<FeatureRow> = monthly
        .iter()
        .enumerate()
        .map(|(i, m)| features(i, m))
        .collect();
    let y: Vec<f64> = monthly.iter().map(|m| m.total).collect();

    let kind = ModelKind::for_history(monthly.len());
    let model = FittedModel::fit(kind, &x, &y)?;

    let residuals: Vec<f64> = x
        .iter()
        .zip(&y)
        .map(|(row, target)| target - model.predict(row))
        .collect();
    let residual_std = population_std_dev(&residuals).unwrap_or(0.0);

    // Synthetic row for the unseen month: historical averages for the shape features
    let counts: Vec<f64> = monthly.iter().map(|m| m.count as f64).collect();
    let means: Vec<f64> = monthly.iter().map(|m| m.mean).collect();
    let stds: Vec<f64> = monthly.iter().map(|m| m.std_dev).collect();
    let last = monthly
        .last()
        .map(|m| m.period)
        .ok_or_else(|| Error::Forecast("No monthly data".into()))?;
    let next_period = last.next();
    let next_row: FeatureRow = [
        monthly.len() as f64,
        mean(&counts).unwrap_or(0.0),
        mean(&means).unwrap_or(0.0),
        mean(&stds).unwrap_or(0.0),
        next_period.month as f64,
    ];

    let raw = model.predict(&next_row);
    if !raw.is_finite() || !residual_std.is_finite() {
        return Err(Error::Forecast(format!(
            "Non-finite prediction ({}) or residual spread ({})",
            raw, residual_std
        )));
    }

    let margin = Z_95 * residual_std;
    let amount = raw.max(0.0);
    let interval = ConfidenceInterval {
        lower: round2((raw - margin).max(0.0)),
        upper: round2((raw + margin).max(amount)),
    };

    debug!(
        months = monthly.len(),
        model = kind.as_str(),
        prediction = amount,
        residual_std,
        "Monthly forecast complete"
    );

    Ok(ForecastResult {
        monthly,
        prediction: Some(Forecast {
            period: next_period,
            amount: round2(amount),
            interval,
            model: kind,
        }),
    })
}

/// Insight wrapper around the monthly forecast
pub struct ForecastInsight;

impl ForecastInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ForecastInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for ForecastInsight {
    fn id(&self) -> InsightType {
        InsightType::Forecast
    }

    fn name(&self) -> &'static str {
        "Monthly Forecast"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
        let result = forecast_next_month(ctx.ledger);
        let forecast = match &result.prediction {
            Some(f) => f,
            None => return Ok(vec![]),
        };

        let budget = ctx.monthly_budget;
        let severity = if budget > 0.0 && forecast.amount > budget {
            Severity::Warning
        } else if budget > 0.0 && forecast.interval.upper > budget {
            Severity::Attention
        } else {
            Severity::Info
        };

        let finding = Finding::new(
            InsightType::Forecast,
            format!("forecast:{}", forecast.period),
            severity,
            "Next Month Forecast",
            format!(
                "Expected spending for {}: {:.2} (95% range {:.2} - {:.2})",
                forecast.period, forecast.amount, forecast.interval.lower, forecast.interval.upper
            ),
        )
        .with_detail(format!(
            "Based on {} months of history using the {} model",
            result.monthly.len(),
            forecast.model
        ))
        .with_data(serde_json::to_value(&result)?);

        Ok(vec![finding])
    }
}
