//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `App` / `open_app` - Resolved config plus the two stores
//! - `authenticate` - Per-invocation credential check
//! - `cmd_init` - Create the data directory, user database and ledger

use std::path::Path;

use anyhow::{bail, Context, Result};
use penny_core::{AppConfig, BudgetProvider, LedgerStore, Transaction, User, UserStore};

/// Everything a command needs: configuration and open stores
pub struct App {
    pub config: AppConfig,
    pub ledgers: LedgerStore,
    pub users: UserStore,
}

impl App {
    /// Build from an already-resolved config (opens the user database)
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let ledgers = LedgerStore::new(&config.data_dir);
        let users = UserStore::new(config.users_db_path()).with_context(|| {
            format!(
                "Failed to open user database at {}",
                config.users_db_path().display()
            )
        })?;
        Ok(Self {
            config,
            ledgers,
            users,
        })
    }

    /// Monthly budget for the user, falling back to the configured default
    pub fn monthly_budget(&self, user: Option<&User>) -> Result<f64> {
        let stored = match user {
            Some(u) => self.users.get_budget(&u.username)?,
            None => None,
        };
        Ok(stored.unwrap_or(self.config.default_monthly_budget))
    }

    /// Load the user's ledger (guest ledger when `user` is None)
    pub fn ledger(&self, user: Option<&User>) -> Result<Vec<Transaction>> {
        let ledger = self
            .ledgers
            .load(username(user))
            .context("Failed to load ledger")?;
        Ok(ledger)
    }

    /// Format an amount with the configured currency prefix
    pub fn money(&self, amount: f64) -> String {
        format!("{} {:.2}", self.config.currency, amount)
    }
}

/// Name used for ledger lookups
pub fn username(user: Option<&User>) -> Option<&str> {
    user.map(|u| u.username.as_str())
}

/// Shown in headings
pub fn display_name(user: Option<&User>) -> &str {
    username(user).unwrap_or("guest")
}

/// Load config (file, then `--data-dir` override) and open the stores
pub fn open_app(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<App> {
    let mut config = AppConfig::load(config_path).context("Failed to load config")?;
    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir.to_path_buf());
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "Resolved configuration");
    App::from_config(config)
}

/// Check credentials for `--user`; no user means the guest ledger
pub fn authenticate(app: &App, user: Option<&str>, password: Option<&str>) -> Result<Option<User>> {
    let Some(username) = user else {
        return Ok(None);
    };

    let Some(password) = password else {
        bail!(
            "Password required for user '{}' (use --password or set PENNY_PASSWORD)",
            username
        );
    };

    match app.users.login(username, password)? {
        Some(user) => Ok(Some(user)),
        None => bail!("Invalid username or password"),
    }
}

pub fn cmd_init(app: &App, user: Option<&User>) -> Result<()> {
    println!(
        "🔧 Initializing Penny in {}...",
        app.config.data_dir.display()
    );

    app.ledgers
        .initialize(username(user))
        .context("Failed to create ledger")?;

    println!("   User database: {}", app.users.path());
    println!(
        "   Ledger: {}",
        app.ledgers.ledger_path(username(user))?.display()
    );
    println!("✅ Ready!");
    println!();
    println!("Next steps:");
    println!("  1. Record an expense: penny add --category Food --amount 12.50");
    println!("  2. Check your budget:  penny status");

    Ok(())
}
