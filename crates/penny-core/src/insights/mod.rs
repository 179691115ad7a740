//! Insight Engine - spending analysis over a ledger snapshot
//!
//! Every function here takes the ledger (and any parameters) by reference
//! and returns a value. Nothing holds state between calls and nothing does
//! I/O; insufficient or degenerate data yields an empty result rather than
//! an error.
//!
//! ## Analyzers
//!
//! - **Forecast** - next-month spend from monthly aggregates
//! - **Budget Monitor** - current month vs. budget, with month-end projection
//! - **Anomaly Detector** - z-score outliers
//! - **Pattern Analyzer** - weekday/weekend and category breakdowns
//! - **Savings Potential** - categories worth cutting back
//!
//! ## Usage
//!
//! ```rust,ignore
//! use penny_core::insights::{AnalysisContext, InsightEngine};
//!
//! let engine = InsightEngine::new();
//! let ctx = AnalysisContext::today(&ledger, 5000.0);
//! let findings = engine.analyze_all(&ctx);
//! ```

pub mod anomaly;
pub mod budget_monitor;
pub mod engine;
pub mod forecast;
pub mod patterns;
pub mod recommend;
pub mod regression;
pub mod savings;
pub mod stats;
pub mod summary;
pub mod trend;
pub mod types;

pub use anomaly::{detect_anomalies, detect_anomalies_with, Anomaly, AnomalyConfig, AnomalyInsight};
pub use budget_monitor::{budget_status, budget_status_now, BudgetInsight, BudgetLevel, BudgetStatus};
pub use engine::{AnalysisContext, Insight, InsightEngine};
pub use forecast::{
    forecast_next_month, monthly_aggregates, ConfidenceInterval, Forecast, ForecastInsight,
    ForecastResult, MonthlyAggregate, YearMonth,
};
pub use patterns::{analyze_patterns, CategoryStats, PatternInsight, SpendingPatterns, WeekdaySpending};
pub use recommend::recommend_category_budgets;
pub use regression::{FittedModel, ModelKind};
pub use savings::{savings_opportunities, SavingsInsight, SavingsOpportunity};
pub use summary::{category_summary, filter_by_category, total_spent, CategoryTotal};
pub use trend::{predict_next_expense, spending_trend, SpendingTrend};
pub use types::{Finding, InsightType, Severity};
