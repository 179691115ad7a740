//! Anomaly detection
//!
//! Flags transactions whose amount sits far from the ledger's overall mean,
//! measured as a z-score against the population standard deviation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::Transaction;

use super::engine::{AnalysisContext, Insight};
use super::stats::{mean, population_std_dev};
use super::types::{Finding, InsightType, Severity};

/// Detection configuration
#[derive(Debug, Clone, Copy)]
pub struct AnomalyConfig {
    /// Fewer usable transactions than this and nothing is reported
    pub min_transactions: usize,
    /// A transaction is anomalous when its z-score is strictly above this
    pub z_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_transactions: 10,
            z_threshold: 2.5,
        }
    }
}

/// A transaction flagged as unusual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Position in the ledger
    pub position: usize,
    pub transaction: Transaction,
    pub z_score: f64,
}

/// Detect anomalies with the default configuration
pub fn detect_anomalies(ledger: &[Transaction]) -> Vec<Anomaly> {
    detect_anomalies_with(ledger, AnomalyConfig::default())
}

/// Detect anomalies, returned in ledger order
pub fn detect_anomalies_with(ledger: &[Transaction], config: AnomalyConfig) -> Vec<Anomaly> {
    let usable: Vec<(usize, &Transaction)> = ledger
        .iter()
        .enumerate()
        .filter(|(_, tx)| tx.is_usable())
        .collect();

    if usable.len() < config.min_transactions {
        return Vec::new();
    }

    let amounts: Vec<f64> = usable.iter().map(|(_, tx)| tx.amount).collect();
    let (avg, std) = match (mean(&amounts), population_std_dev(&amounts)) {
        (Some(m), Some(s)) => (m, s),
        _ => return Vec::new(),
    };

    // Identical amounts: every z-score would be 0/0
    if !std.is_finite() || std <= f64::EPSILON * avg.abs().max(1.0) {
        debug!(count = amounts.len(), "Zero variance, no anomalies");
        return Vec::new();
    }

    usable
        .into_iter()
        .filter_map(|(position, tx)| {
            let z_score = (tx.amount - avg).abs() / std;
            (z_score.is_finite() && z_score > config.z_threshold).then(|| Anomaly {
                position,
                transaction: tx.clone(),
                z_score,
            })
        })
        .collect()
}

/// Insight wrapper around the anomaly detector
pub struct AnomalyInsight {
    config: AnomalyConfig,
}

impl AnomalyInsight {
    pub fn new() -> Self {
        Self {
            config: AnomalyConfig::default(),
        }
    }
}

impl Default for AnomalyInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for AnomalyInsight {
    fn id(&self) -> InsightType {
        InsightType::Anomaly
    }

    fn name(&self) -> &'static str {
        "Anomaly Detector"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for anomaly in detect_anomalies_with(ctx.ledger, self.config) {
            let tx = &anomaly.transaction;
            let severity = if anomaly.z_score > 2.0 * self.config.z_threshold {
                Severity::Warning
            } else {
                Severity::Attention
            };

            let finding = Finding::new(
                InsightType::Anomaly,
                format!("anomaly:{}", anomaly.position),
                severity,
                "Unusual Expense",
                format!(
                    "{:.2} on {} ({}) is {:.1} standard deviations from your usual spend",
                    tx.amount, tx.date, tx.category, anomaly.z_score
                ),
            )
            .with_data(serde_json::to_value(&anomaly)?);

            findings.push(finding);
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ledger_of(amounts: &[f64]) -> Vec<Transaction> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                Transaction::new(
                    NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                    "Food",
                    a,
                    "",
                )
            })
            .collect()
    }

    #[test]
    fn test_single_outlier() {
        let mut amounts = vec![1000.0; 9];
        amounts.push(5000.0);
        let anomalies = detect_anomalies(&ledger_of(&amounts));

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].position, 9);
        assert_eq!(anomalies[0].transaction.amount, 5000.0);
        assert!(anomalies[0].z_score > 2.5);
        assert!((anomalies[0].z_score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_transactions() {
        let mut amounts = vec![1.0; 8];
        amounts.push(9999.0);
        let anomalies = detect_anomalies(&ledger_of(&amounts));
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_identical_amounts() {
        let anomalies = detect_anomalies(&ledger_of(&[42.0; 25]));
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Mean 101, population std 3: the 110 sits at exactly z = 3
        let mut amounts = vec![100.0; 9];
        amounts.push(110.0);
        let ledger = ledger_of(&amounts);

        let at_threshold = AnomalyConfig {
            min_transactions: 10,
            z_threshold: 3.0,
        };
        assert!(detect_anomalies_with(&ledger, at_threshold).is_empty());

        let below = AnomalyConfig {
            min_transactions: 10,
            z_threshold: 2.99,
        };
        let anomalies = detect_anomalies_with(&ledger, below);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].position, 9);
        assert_eq!(anomalies[0].z_score, 3.0);
    }

    #[test]
    fn test_results_in_ledger_order() {
        let mut amounts = vec![10.0; 30];
        amounts[3] = 500.0;
        amounts[20] = 480.0;
        let anomalies = detect_anomalies(&ledger_of(&amounts));

        let positions: Vec<usize> = anomalies.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![3, 20]);
    }

    #[test]
    fn test_anomaly_insight_findings() {
        let mut amounts = vec![1000.0; 9];
        amounts.push(5000.0);
        let ledger = ledger_of(&amounts);
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let ctx = AnalysisContext::new(&ledger, 5000.0, today);

        let findings = AnomalyInsight::new().analyze(&ctx).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].key, "anomaly:9");
        assert_eq!(findings[0].severity, Severity::Attention);
    }
}
