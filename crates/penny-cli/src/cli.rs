//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Penny - Track expenses and see where the money goes
#[derive(Parser)]
#[command(name = "penny")]
#[command(about = "Personal expense tracker with spending insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to <config dir>/penny/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding ledgers and the user database (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// User whose ledger to work on (guest ledger if omitted)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Password for --user
    ///
    /// Checked on every invocation; there are no sessions.
    #[arg(long, env = "PENNY_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print insight results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, user database and ledger
    Init,

    /// Create a new user (password from --password or PENNY_PASSWORD)
    Register,

    /// Check credentials for --user
    Login,

    /// Record an expense
    Add {
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Category (Food, Travel, Shopping, Bills, Health, Other, or your own)
        #[arg(short, long)]
        category: String,

        /// Amount spent
        #[arg(short, long)]
        amount: f64,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// List recorded expenses
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,

        /// Show only the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete an expense by its position (as shown by `list`)
    Remove {
        /// 1-based position in the ledger
        position: usize,
    },

    /// Merge expenses from a Date,Category,Amount,Note CSV
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export the ledger as CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show or change the monthly budget
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// This month's spending against the budget
    Status,

    /// Forecast next month's spending
    Forecast,

    /// Flag unusually large or small expenses
    Anomalies,

    /// Spending by weekday, weekend and category
    Patterns,

    /// Split a budget across categories by past spending
    Recommend {
        /// Total to split (defaults to the monthly budget)
        #[arg(short, long)]
        total: Option<f64>,
    },

    /// Categories where a cut would save the most
    Savings,

    /// Next-expense prediction and recent direction
    Trend,

    /// Run every analyzer and show findings, most urgent first
    Dashboard,
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Set the monthly budget
    Set {
        /// Monthly budget amount
        amount: f64,
    },
}
