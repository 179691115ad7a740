//! Storage collaborators
//!
//! - `ledger` - Per-user CSV expense ledgers (append, load, rewrite, import)
//! - `users` - SQLite user store (credentials, budget preferences)
//!
//! The insight functions never touch storage. Callers load a ledger snapshot
//! through these stores and pass it in.

mod ledger;
mod users;

pub use ledger::{fingerprint, parse_date, ImportStats, LedgerStore};
pub use users::{validate_username, DbConn, DbPool, UserStore};

use crate::error::Result;
use crate::models::Transaction;

/// Anything that can hand out a user's ledger snapshot
pub trait LedgerProvider {
    /// Load the ordered ledger for a user (`None` = guest). Missing ledgers are empty.
    fn load_ledger(&self, user: Option<&str>) -> Result<Vec<Transaction>>;
}

/// Anything that stores per-user monthly budget preferences
pub trait BudgetProvider {
    fn get_budget(&self, username: &str) -> Result<Option<f64>>;

    fn set_budget(&self, username: &str, amount: f64) -> Result<()>;
}
