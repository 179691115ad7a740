//! Penny Core Library
//!
//! Shared functionality for the Penny expense tracker:
//! - Per-user CSV expense ledgers
//! - SQLite user store with password hashing and budget preferences
//! - Configuration loading
//! - Spending insights: forecasting, budget monitoring, anomaly detection,
//!   patterns, budget recommendations and savings potential

pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod store;

/// Test utilities: ledger builders and temporary stores
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use insights::{AnalysisContext, Finding, Insight, InsightEngine, InsightType, Severity};
pub use models::{NewTransaction, Transaction, User, DEFAULT_CATEGORIES};
pub use store::{BudgetProvider, ImportStats, LedgerProvider, LedgerStore, UserStore};
