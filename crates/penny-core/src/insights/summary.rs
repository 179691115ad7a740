//! Ledger summaries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{round2, Transaction};

/// Total spent in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
}

/// Sum of all usable amounts, rounded to cents
pub fn total_spent(ledger: &[Transaction]) -> f64 {
    round2(
        ledger
            .iter()
            .filter(|tx| tx.is_usable())
            .map(|tx| tx.amount)
            .sum(),
    )
}

/// Unrounded per-category sums of usable amounts
pub(crate) fn category_totals(ledger: &[Transaction]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for tx in ledger.iter().filter(|tx| tx.is_usable()) {
        *totals.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
    }
    totals
}

/// Category totals, largest first, ties broken by name
pub fn category_summary(ledger: &[Transaction]) -> Vec<CategoryTotal> {
    let mut summary: Vec<CategoryTotal> = category_totals(ledger)
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category,
            amount: round2(amount),
        })
        .collect();

    summary.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    summary
}

/// Transactions of one category, in ledger order
pub fn filter_by_category<'a>(ledger: &'a [Transaction], category: &str) -> Vec<&'a Transaction> {
    ledger.iter().filter(|tx| tx.category == category).collect()
}
