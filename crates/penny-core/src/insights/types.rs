//! Core types for the Insight Engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of insights that can be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    /// Next-month spend forecast
    Forecast,
    /// Current month against the monthly budget
    BudgetStatus,
    /// Individual transactions far from the usual amount
    Anomaly,
    /// Categories where a cut would save the most
    SavingsOpportunity,
    /// Weekday/weekend spending habits
    SpendingPattern,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Forecast => "forecast",
            InsightType::BudgetStatus => "budget_status",
            InsightType::Anomaly => "anomaly",
            InsightType::SavingsOpportunity => "savings_opportunity",
            InsightType::SpendingPattern => "spending_pattern",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity level of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Worth attention but not urgent
    Attention,
    /// Should be addressed soon
    Warning,
    /// Requires immediate attention
    Alert,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Attention => "attention",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Info => 1,
            Severity::Attention => 2,
            Severity::Warning => 3,
            Severity::Alert => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finding produced by an insight analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Type of insight that generated this finding
    pub insight_type: InsightType,
    /// Unique key for deduplication (e.g., "anomaly:17")
    pub key: String,
    /// How urgent/important this finding is
    pub severity: Severity,
    /// Short title for the finding (e.g., "Unusual Expense")
    pub title: String,
    /// One-line summary
    pub summary: String,
    /// Optional longer explanation with details
    pub detail: Option<String>,
    /// Insight-specific structured data
    pub data: serde_json::Value,
}

impl Finding {
    pub fn new(
        insight_type: InsightType,
        key: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            insight_type,
            key: key.into(),
            severity,
            title: title.into(),
            summary: summary.into(),
            detail: None,
            data: serde_json::Value::Null,
        }
    }

    /// Add optional detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_type_serialization() {
        assert_eq!(InsightType::BudgetStatus.as_str(), "budget_status");
        assert_eq!(InsightType::SavingsOpportunity.to_string(), "savings_opportunity");
        assert_eq!(
            serde_json::to_value(InsightType::SpendingPattern).unwrap(),
            "spending_pattern"
        );
    }

    #[test]
    fn test_severity_priority() {
        assert!(Severity::Alert.priority() > Severity::Warning.priority());
        assert!(Severity::Warning.priority() > Severity::Attention.priority());
        assert!(Severity::Attention.priority() > Severity::Info.priority());
    }

    #[test]
    fn test_finding_builder() {
        let finding = Finding::new(
            InsightType::Anomaly,
            "test:key",
            Severity::Warning,
            "Test Title",
            "Test summary",
        )
        .with_detail("More details here")
        .with_data(serde_json::json!({"amount": 10.0}));

        assert_eq!(finding.key, "test:key");
        assert_eq!(finding.detail.unwrap(), "More details here");
        assert_eq!(finding.data["amount"], 10.0);
    }
}
