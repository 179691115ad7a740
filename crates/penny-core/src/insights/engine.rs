//! Insight Engine - runs every analyzer over one ledger snapshot

use chrono::NaiveDate;

use crate::models::Transaction;
use crate::Result;

use super::types::Finding;
use super::{
    AnomalyInsight, BudgetInsight, ForecastInsight, InsightType, PatternInsight, SavingsInsight,
};

/// Context provided to insight analyzers
///
/// An immutable snapshot: analyzers read the ledger and parameters here and
/// nothing else.
pub struct AnalysisContext<'a> {
    /// The user's ledger, in insertion order
    pub ledger: &'a [Transaction],
    /// Monthly budget to measure against
    pub monthly_budget: f64,
    /// "Today" for current-month calculations
    pub today: NaiveDate,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(ledger: &'a [Transaction], monthly_budget: f64, today: NaiveDate) -> Self {
        Self {
            ledger,
            monthly_budget,
            today,
        }
    }

    /// Create context dated at the local wall-clock day
    pub fn today(ledger: &'a [Transaction], monthly_budget: f64) -> Self {
        Self::new(ledger, monthly_budget, chrono::Local::now().date_naive())
    }
}

/// Trait for insight analyzers
pub trait Insight: Send + Sync {
    /// Unique identifier for this insight type
    fn id(&self) -> InsightType;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Analyze the snapshot and produce findings
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>>;
}

/// The main insight engine that orchestrates analysis
pub struct InsightEngine {
    insights: Vec<Box<dyn Insight>>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create a new insight engine with built-in insight types
    pub fn new() -> Self {
        let mut engine = Self { insights: vec![] };

        // Register built-in insights
        engine.register(Box::new(BudgetInsight::new()));
        engine.register(Box::new(ForecastInsight::new()));
        engine.register(Box::new(AnomalyInsight::new()));
        engine.register(Box::new(SavingsInsight::new()));
        engine.register(Box::new(PatternInsight::new()));

        engine
    }

    /// Create an engine with no analyzers registered
    pub fn empty() -> Self {
        Self { insights: vec![] }
    }

    /// Register an insight analyzer
    pub fn register(&mut self, insight: Box<dyn Insight>) {
        self.insights.push(insight);
    }

    /// Names of the registered analyzers, in run order
    pub fn names(&self) -> Vec<&'static str> {
        self.insights.iter().map(|i| i.name()).collect()
    }

    /// Run all insight analyzers and collect findings, most urgent first
    ///
    /// A failing analyzer is logged and skipped.
    pub fn analyze_all(&self, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let mut all_findings = vec![];

        for insight in &self.insights {
            match insight.analyze(ctx) {
                Ok(findings) => {
                    tracing::debug!(
                        insight = insight.id().as_str(),
                        count = findings.len(),
                        "Insight analysis complete"
                    );
                    all_findings.extend(findings);
                }
                Err(e) => {
                    tracing::warn!(
                        insight = insight.id().as_str(),
                        error = %e,
                        "Insight analysis failed"
                    );
                }
            }
        }

        // Stable sort keeps analyzer order within a severity
        all_findings.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));
        all_findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::insights::Severity;

    struct FailingInsight;

    impl Insight for FailingInsight {
        fn id(&self) -> InsightType {
            InsightType::Anomaly
        }

        fn name(&self) -> &'static str {
            "Failing"
        }

        fn analyze(&self, _ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
            Err(Error::InvalidData("boom".into()))
        }
    }

    struct FixedInsight(Severity);

    impl Insight for FixedInsight {
        fn id(&self) -> InsightType {
            InsightType::SpendingPattern
        }

        fn name(&self) -> &'static str {
            "Fixed"
        }

        fn analyze(&self, _ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
            Ok(vec![Finding::new(
                InsightType::SpendingPattern,
                format!("fixed:{}", self.0),
                self.0,
                "Fixed",
                "Fixed finding",
            )])
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_default_engine_registers_builtins() {
        let engine = InsightEngine::new();
        assert_eq!(engine.names().len(), 5);
    }

    #[test]
    fn test_failing_insight_is_skipped() {
        let mut engine = InsightEngine::empty();
        engine.register(Box::new(FailingInsight));
        engine.register(Box::new(FixedInsight(Severity::Info)));

        let ctx = AnalysisContext::new(&[], 1000.0, today());
        let findings = engine.analyze_all(&ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].key, "fixed:info");
    }

    #[test]
    fn test_findings_sorted_by_severity() {
        let mut engine = InsightEngine::empty();
        engine.register(Box::new(FixedInsight(Severity::Info)));
        engine.register(Box::new(FixedInsight(Severity::Alert)));
        engine.register(Box::new(FixedInsight(Severity::Attention)));

        let ctx = AnalysisContext::new(&[], 1000.0, today());
        let severities: Vec<Severity> = engine
            .analyze_all(&ctx)
            .into_iter()
            .map(|f| f.severity)
            .collect();
        assert_eq!(
            severities,
            vec![Severity::Alert, Severity::Attention, Severity::Info]
        );
    }

    #[test]
    fn test_empty_ledger_only_reports_budget() {
        let engine = InsightEngine::new();
        let ctx = AnalysisContext::new(&[], 1000.0, today());
        let findings = engine.analyze_all(&ctx);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].insight_type, InsightType::BudgetStatus);
        assert_eq!(findings[0].severity, Severity::Info);
    }
}
