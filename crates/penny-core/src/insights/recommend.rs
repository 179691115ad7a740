//! Budget Recommender
//!
//! Splits a total budget across categories in proportion to how much each
//! category has historically taken of total spend.

use std::collections::BTreeMap;

use crate::models::{round2, Transaction};

use super::summary::category_totals;

/// Recommended amount per category
///
/// Categories never seen in the ledger get no entry. Empty when the ledger
/// is empty, nothing has been spent, or the total budget is not positive.
pub fn recommend_category_budgets(
    ledger: &[Transaction],
    total_budget: f64,
) -> BTreeMap<String, f64> {
    if !total_budget.is_finite() || total_budget <= 0.0 {
        return BTreeMap::new();
    }

    let totals = category_totals(ledger);
    let spent: f64 = totals.values().sum();
    if !spent.is_finite() || spent <= 0.0 {
        return BTreeMap::new();
    }

    totals
        .into_iter()
        .map(|(category, amount)| (category, round2(amount / spent * total_budget)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(category: &str, amount: f64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            category,
            amount,
            "",
        )
    }

    #[test]
    fn test_proportional_split() {
        let ledger = vec![tx("Food", 100.0), tx("Travel", 700.0), tx("Food", 200.0)];
        let recs = recommend_category_budgets(&ledger, 1000.0);

        assert_eq!(recs.len(), 2);
        assert_eq!(recs["Food"], 300.0);
        assert_eq!(recs["Travel"], 700.0);
    }

    #[test]
    fn test_sum_matches_total() {
        let ledger = vec![
            tx("Food", 33.0),
            tx("Bills", 33.0),
            tx("Health", 34.0),
            tx("Other", 7.5),
        ];
        let recs = recommend_category_budgets(&ledger, 2500.0);
        let sum: f64 = recs.values().sum();

        assert!((sum - 2500.0).abs() < 0.01 * recs.len() as f64);
        assert!(!recs.contains_key("Travel"));
    }

    #[test]
    fn test_empty_and_zero_spend() {
        assert!(recommend_category_budgets(&[], 1000.0).is_empty());
        assert!(recommend_category_budgets(&[tx("Food", 0.0)], 1000.0).is_empty());
        assert!(recommend_category_budgets(&[tx("Food", 10.0)], 0.0).is_empty());
    }
}
