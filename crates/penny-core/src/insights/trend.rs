//! Per-transaction trend helpers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{round2, Transaction};

/// Direction of the two most recent entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingTrend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl SpendingTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendingTrend::Increasing => "increasing",
            SpendingTrend::Decreasing => "decreasing",
            SpendingTrend::Stable => "stable",
            SpendingTrend::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for SpendingTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Predict the next entry by least squares of amount on ledger position
///
/// `None` for an empty ledger. Never negative.
pub fn predict_next_expense(ledger: &[Transaction]) -> Option<f64> {
    let amounts: Vec<f64> = ledger
        .iter()
        .filter(|tx| tx.is_usable())
        .map(|tx| tx.amount)
        .collect();

    let n = amounts.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(round2(amounts[0]));
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = amounts.iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in amounts.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;
    let prediction = intercept + slope * nf;

    if !prediction.is_finite() {
        return None;
    }
    Some(round2(prediction.max(0.0)))
}

/// Compare the last two usable entries in ledger order
pub fn spending_trend(ledger: &[Transaction]) -> SpendingTrend {
    let mut recent = ledger.iter().rev().filter(|tx| tx.is_usable());
    let (last, previous) = match (recent.next(), recent.next()) {
        (Some(last), Some(previous)) => (last.amount, previous.amount),
        _ => return SpendingTrend::InsufficientData,
    };

    if last > previous {
        SpendingTrend::Increasing
    } else if last < previous {
        SpendingTrend::Decreasing
    } else {
        SpendingTrend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ledger_of(amounts: &[f64]) -> Vec<Transaction> {
        amounts
            .iter()
            .map(|&a| {
                Transaction::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Food", a, "")
            })
            .collect()
    }

    #[test]
    fn test_predict_linear_series() {
        assert_eq!(predict_next_expense(&ledger_of(&[10.0, 20.0, 30.0])), Some(40.0));
    }

    #[test]
    fn test_predict_edge_cases() {
        assert_eq!(predict_next_expense(&[]), None);
        assert_eq!(predict_next_expense(&ledger_of(&[42.5])), Some(42.5));
        assert_eq!(predict_next_expense(&ledger_of(&[7.0, 7.0, 7.0])), Some(7.0));
    }

    #[test]
    fn test_predict_clamped_at_zero() {
        assert_eq!(predict_next_expense(&ledger_of(&[300.0, 200.0, 100.0, 0.0])), Some(0.0));
    }

    #[test]
    fn test_spending_trend() {
        assert_eq!(spending_trend(&[]), SpendingTrend::InsufficientData);
        assert_eq!(spending_trend(&ledger_of(&[5.0])), SpendingTrend::InsufficientData);
        assert_eq!(spending_trend(&ledger_of(&[5.0, 9.0])), SpendingTrend::Increasing);
        assert_eq!(spending_trend(&ledger_of(&[9.0, 5.0])), SpendingTrend::Decreasing);
        assert_eq!(spending_trend(&ledger_of(&[1.0, 5.0, 5.0])), SpendingTrend::Stable);
    }
}
