//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared setup (open_app, authenticate) and init
//! - `users` - Register, login and budget commands
//! - `expenses` - Ledger commands (add, list, remove, import, export)
//! - `insights` - Forecast, anomalies, patterns, recommend, savings, trend
//! - `status` - Budget status and dashboard

pub mod core;
pub mod expenses;
pub mod insights;
pub mod status;
pub mod users;

// Re-export command functions for main.rs
pub use core::*;
pub use expenses::*;
pub use insights::*;
pub use status::*;
pub use users::*;

use anyhow::Result;
use serde::Serialize;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
