//! SQLite user store: credentials and monthly budget preferences

use std::path::Path;
use std::sync::{Arc, OnceLock};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rand::RngCore;
use regex::Regex;
use rusqlite::{params, OptionalExtension};
use tempfile::TempDir;
use tracing::{debug, info};

use super::BudgetProvider;
use crate::error::{Error, Result};
use crate::models::User;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Usernames end up in ledger file names, so keep them to a safe alphabet
const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]{3,32}$";

/// Check that a username is acceptable (and safe to embed in a file name)
pub fn validate_username(username: &str) -> Result<()> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = match RE.get() {
        Some(re) => re,
        None => {
            let compiled = Regex::new(USERNAME_PATTERN)?;
            RE.get_or_init(|| compiled)
        }
    };

    if !re.is_match(username) || username.starts_with('.') {
        return Err(Error::InvalidData(format!(
            "Invalid username '{}': use 3-32 letters, digits, '_', '-' or '.'",
            username
        )));
    }
    Ok(())
}

/// Parse a SQLite datetime string into a DateTime<Utc>
fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Hash a password into an Argon2id PHC string with a random salt
fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| Error::Auth(format!("Failed to create salt: {}", e)))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// User database wrapper with connection pooling
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    /// Backing directory of a throwaway database, removed on last drop
    _scratch: Option<Arc<TempDir>>,
}

impl UserStore {
    /// Open (creating if needed) the user database at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(4).build(manager)?;

        let store = Self {
            pool,
            db_path: path.display().to_string(),
            _scratch: None,
        };
        store.run_migrations()?;

        Ok(store)
    }

    /// Create a throwaway database (for testing)
    pub fn in_memory() -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("penny_test_").tempdir()?;
        let mut store = Self::new(scratch.path().join("users.db"))?;
        store._scratch = Some(Arc::new(scratch));
        Ok(store)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                monthly_budget REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        debug!(path = %self.db_path, "User store ready");
        Ok(())
    }

    /// Create a new account
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        validate_username(username)?;
        if password.is_empty() {
            return Err(Error::InvalidData("Password must not be empty".into()));
        }

        if self.get_user(username)?.is_some() {
            return Err(Error::UserExists(username.to_string()));
        }

        let password_hash = hash_password(password)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::UserExists(username.to_string())
            }
            other => Error::Database(other),
        })?;

        info!(user = username, "Registered user");
        self.get_user(username)?
            .ok_or_else(|| Error::NotFound(format!("User {}", username)))
    }

    /// Verify credentials, returning the user on success
    pub fn login(&self, username: &str, password: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(hash) if verify_password(password, &hash) => {
                debug!(user = username, "Login succeeded");
                self.get_user(username)
            }
            _ => {
                debug!(user = username, "Login rejected");
                Ok(None)
            }
        }
    }

    /// Look up a user by name
    pub fn get_user(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, monthly_budget, created_at FROM users WHERE username = ?1",
                params![username],
                |row| {
                    let created_at_str: String = row.get(3)?;
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        monthly_budget: row.get(2)?,
                        created_at: parse_datetime(&created_at_str),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}

impl BudgetProvider for UserStore {
    fn get_budget(&self, username: &str) -> Result<Option<f64>> {
        self.get_user(username)?
            .map(|u| u.monthly_budget)
            .ok_or_else(|| Error::NotFound(format!("User {}", username)))
    }

    fn set_budget(&self, username: &str, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Budget must be a positive amount, got {}",
                amount
            )));
        }

        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET monthly_budget = ?1 WHERE username = ?2",
            params![amount, username],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("User {}", username)));
        }

        info!(user = username, amount, "Updated monthly budget");
        Ok(())
    }
}
