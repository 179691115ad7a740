//! Domain models for Penny

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Categories offered when recording an expense.
///
/// The category set is open: any non-empty string is accepted, these are
/// just the ones the CLI suggests.
pub const DEFAULT_CATEGORIES: [&str; 6] = ["Food", "Travel", "Shopping", "Bills", "Health", "Other"];

/// A recorded expense.
///
/// Transactions are immutable once written. They have no id of their own;
/// a transaction is identified by its position in the owning ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub category: String,
    /// Non-negative currency amount
    pub amount: f64,
    pub note: String,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        amount: f64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date,
            category: category.into(),
            amount,
            note: note.into(),
        }
    }

    /// Whether the amount can take part in arithmetic.
    ///
    /// Loaded ledgers never contain unusable amounts, but ledgers built by
    /// hand can, and the insight functions skip them.
    pub fn is_usable(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0
    }
}

/// A transaction as submitted by the user, before it is written to a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub note: String,
}

impl NewTransaction {
    /// Normalize into the stored form: amount rounded to cents, note trimmed
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            date: self.date,
            category: self.category.trim().to_string(),
            amount: round2(self.amount),
            note: self.note.trim().to_string(),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Monthly budget preference, if the user ever set one
    pub monthly_budget: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Round a currency value to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.006), 10.01);
        assert_eq!(round2(7.4567), 7.46);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_new_transaction_normalizes() {
        let tx = NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: " Food ".to_string(),
            amount: 12.344,
            note: "  lunch  ".to_string(),
        }
        .into_transaction();

        assert_eq!(tx.category, "Food");
        assert_eq!(tx.note, "lunch");
        assert!((tx.amount - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_is_usable() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(Transaction::new(date, "Food", 0.0, "").is_usable());
        assert!(!Transaction::new(date, "Food", f64::NAN, "").is_usable());
        assert!(!Transaction::new(date, "Food", -5.0, "").is_usable());
    }
}
