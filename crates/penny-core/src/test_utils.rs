//! Test utilities for penny-core
//!
//! Ledger builders and throwaway stores for unit and integration tests.

use chrono::{Datelike, Duration, NaiveDate};
use tempfile::TempDir;

use crate::models::Transaction;
use crate::store::{LedgerStore, UserStore};

/// Shorthand date constructor; panics on an invalid date
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {}-{}-{}", year, month, day))
}

/// One transaction with an empty note
pub fn tx(on: NaiveDate, category: &str, amount: f64) -> Transaction {
    Transaction::new(on, category, amount, "")
}

/// Fluent ledger construction
#[derive(Debug, Default, Clone)]
pub struct LedgerBuilder {
    ledger: Vec<Transaction>,
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one transaction
    pub fn add(mut self, on: NaiveDate, category: &str, amount: f64) -> Self {
        self.ledger.push(tx(on, category, amount));
        self
    }

    /// Append one transaction with a note
    pub fn add_with_note(mut self, on: NaiveDate, category: &str, amount: f64, note: &str) -> Self {
        self.ledger.push(Transaction::new(on, category, amount, note));
        self
    }

    /// Append one transaction per month, on the 10th, starting at `start`
    pub fn monthly(mut self, start: NaiveDate, category: &str, amounts: &[f64]) -> Self {
        let (mut year, mut month) = (start.year(), start.month());
        for &amount in amounts {
            self.ledger.push(tx(date(year, month, 10), category, amount));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        self
    }

    /// Append one transaction per day starting at `start`
    pub fn daily(mut self, start: NaiveDate, category: &str, amounts: &[f64]) -> Self {
        for (offset, &amount) in amounts.iter().enumerate() {
            self.ledger
                .push(tx(start + Duration::days(offset as i64), category, amount));
        }
        self
    }

    pub fn build(self) -> Vec<Transaction> {
        self.ledger
    }
}

/// A ledger store and user store rooted in a fresh temp directory
///
/// The directory is removed when the returned `TempDir` drops.
pub fn temp_stores() -> (TempDir, LedgerStore, UserStore) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ledgers = LedgerStore::new(dir.path());
    let users = UserStore::new(dir.path().join("users.db")).expect("open user store");
    (dir, ledgers, users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_rolls_over_year() {
        let ledger = LedgerBuilder::new()
            .monthly(date(2023, 11, 1), "Bills", &[1.0, 2.0, 3.0])
            .build();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger[2].date, date(2024, 1, 10));
    }

    #[test]
    fn test_daily_consecutive() {
        let ledger = LedgerBuilder::new()
            .daily(date(2024, 2, 28), "Food", &[1.0, 2.0, 3.0])
            .build();

        assert_eq!(ledger[1].date, date(2024, 2, 29));
        assert_eq!(ledger[2].date, date(2024, 3, 1));
    }
}
