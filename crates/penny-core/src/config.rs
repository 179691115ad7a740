//! Application configuration
//!
//! Configuration is read from a TOML file, falling back to built-in defaults
//! for anything the file leaves out:
//!
//! ```toml
//! [storage]
//! data_dir = "/home/me/.local/share/penny"
//!
//! [budget]
//! default_monthly = 5000.0
//!
//! [display]
//! currency = "Rs."
//! ```
//!
//! Lookup order: explicit path (if it exists), then
//! `<config_dir>/penny/config.toml`, then defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Budget used when a user never set one
pub const DEFAULT_MONTHLY_BUDGET: f64 = 5000.0;

/// Currency prefix used when printing amounts
pub const DEFAULT_CURRENCY: &str = "Rs.";

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding per-user ledgers and the user database
    pub data_dir: PathBuf,
    /// Monthly budget used when the user has no stored preference
    pub default_monthly_budget: f64,
    /// Prefix for printed amounts
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_monthly_budget: DEFAULT_MONTHLY_BUDGET,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration (override first, then default location)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        match path {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading config");
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(storage) = raw.storage {
            if let Some(dir) = storage.data_dir {
                config.data_dir = dir;
            }
        }

        if let Some(budget) = raw.budget {
            if let Some(amount) = budget.default_monthly {
                if amount.is_finite() && amount > 0.0 {
                    config.default_monthly_budget = amount;
                } else {
                    warn!(amount, "Ignoring non-positive default budget");
                }
            }
        }

        if let Some(display) = raw.display {
            if let Some(currency) = display.currency {
                if currency.trim().is_empty() {
                    warn!("Ignoring empty currency symbol");
                } else {
                    config.currency = currency;
                }
            }
        }

        Ok(config)
    }

    /// Replace the data directory (CLI `--data-dir` wins over the file)
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    /// Path of the SQLite user database
    pub fn users_db_path(&self) -> PathBuf {
        self.data_dir.join("users.db")
    }
}

/// Default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("penny").join("config.toml"))
}

/// Default data directory (~/.local/share/penny on Linux)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("penny"))
        .unwrap_or_else(|| PathBuf::from("penny-data"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    storage: Option<RawStorage>,
    budget: Option<RawBudget>,
    display: Option<RawDisplay>,
}

#[derive(Debug, Deserialize)]
struct RawStorage {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawBudget {
    default_monthly: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDisplay {
    currency: Option<String>,
}
