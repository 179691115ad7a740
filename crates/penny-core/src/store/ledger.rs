//! CSV-backed expense ledgers, one file per user
//!
//! File layout: `<data_dir>/expenses_<user>.csv` (or `expenses_guest.csv`)
//! with the header `Date,Category,Amount,Note`. Rows are only ever appended;
//! deletion rewrites the whole file.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::users::validate_username;
use super::LedgerProvider;
use crate::error::{Error, Result};
use crate::models::{round2, NewTransaction, Transaction};

const HEADER: [&str; 4] = ["Date", "Category", "Amount", "Note"];

/// Outcome of merging another CSV into a ledger
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

/// Per-user CSV ledger files under a data directory
#[derive(Debug, Clone)]
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ledger file for a user, `None` meaning the guest ledger
    pub fn ledger_path(&self, user: Option<&str>) -> Result<PathBuf> {
        let file = match user {
            Some(name) => {
                validate_username(name)?;
                format!("expenses_{}.csv", name)
            }
            None => "expenses_guest.csv".to_string(),
        };
        Ok(self.dir.join(file))
    }

    /// Create an empty ledger (header only) if none exists yet
    pub fn initialize(&self, user: Option<&str>) -> Result<()> {
        let path = self.ledger_path(user)?;
        if path.exists() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)?;
        let mut writer = WriterBuilder::new().from_path(&path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        info!(path = %path.display(), "Initialized ledger");
        Ok(())
    }

    /// Append one transaction to the end of the ledger
    pub fn append(&self, user: Option<&str>, new_tx: NewTransaction) -> Result<Transaction> {
        if !new_tx.amount.is_finite() || new_tx.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Amount must be a non-negative number, got {}",
                new_tx.amount
            )));
        }
        if new_tx.category.trim().is_empty() {
            return Err(Error::InvalidData("Category must not be empty".into()));
        }

        let tx = new_tx.into_transaction();
        let path = self.ledger_path(user)?;
        fs::create_dir_all(&self.dir)?;

        // Header goes in only when the file is brand new (or was left empty)
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        write_row(&mut writer, &tx)?;
        writer.flush()?;

        debug!(
            path = %path.display(),
            category = %tx.category,
            amount = tx.amount,
            "Appended transaction"
        );
        Ok(tx)
    }

    /// Load a user's ledger in insertion order
    ///
    /// A missing file is an empty ledger. Rows with an unparseable date or a
    /// non-numeric / negative amount are skipped with a warning.
    pub fn load(&self, user: Option<&str>) -> Result<Vec<Transaction>> {
        let path = self.ledger_path(user)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)?;
        let (ledger, skipped) = read_ledger(file)?;
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "Skipped unusable ledger rows");
        }
        Ok(ledger)
    }

    /// Replace the whole ledger atomically (temp file + rename)
    pub fn rewrite(&self, user: Option<&str>, ledger: &[Transaction]) -> Result<()> {
        let path = self.ledger_path(user)?;
        fs::create_dir_all(&self.dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(&mut tmp);
            writer.write_record(HEADER)?;
            for tx in ledger {
                write_row(&mut writer, tx)?;
            }
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        info!(path = %path.display(), count = ledger.len(), "Rewrote ledger");
        Ok(())
    }

    /// Delete the transaction at `position` (0-based ledger order)
    pub fn remove(&self, user: Option<&str>, position: usize) -> Result<Transaction> {
        let mut ledger = self.load(user)?;
        if position >= ledger.len() {
            return Err(Error::NotFound(format!(
                "No transaction at position {} (ledger has {})",
                position,
                ledger.len()
            )));
        }

        let removed = ledger.remove(position);
        self.rewrite(user, &ledger)?;
        Ok(removed)
    }

    /// Merge another `Date,Category,Amount,Note` CSV into the ledger
    ///
    /// Rows already present (same date, category, amount and note) are skipped,
    /// including repeats within the imported file itself.
    pub fn import<R: Read>(&self, user: Option<&str>, reader: R) -> Result<ImportStats> {
        let mut ledger = self.load(user)?;
        let mut seen: HashSet<String> = ledger.iter().map(fingerprint).collect();

        let (incoming, invalid) = read_ledger(reader)?;
        let mut stats = ImportStats {
            invalid,
            ..Default::default()
        };

        for tx in incoming {
            let tx = Transaction {
                amount: round2(tx.amount),
                ..tx
            };
            if seen.insert(fingerprint(&tx)) {
                ledger.push(tx);
                stats.imported += 1;
            } else {
                stats.duplicates += 1;
            }
        }

        if stats.imported > 0 {
            self.rewrite(user, &ledger)?;
        }

        info!(
            imported = stats.imported,
            duplicates = stats.duplicates,
            invalid = stats.invalid,
            "Ledger import complete"
        );
        Ok(stats)
    }

    /// Write the ledger as CSV (header + rows)
    pub fn export<W: Write>(&self, user: Option<&str>, writer: W) -> Result<usize> {
        let ledger = self.load(user)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
        writer.write_record(HEADER)?;
        for tx in &ledger {
            write_row(&mut writer, tx)?;
        }
        writer.flush()?;
        Ok(ledger.len())
    }
}

impl LedgerProvider for LedgerStore {
    fn load_ledger(&self, user: Option<&str>) -> Result<Vec<Transaction>> {
        self.load(user)
    }
}

/// ASCII unit separator between hashed fields
const FIELD_SEPARATOR: u8 = 0x1f;

/// Stable identity of a transaction's content, used for import deduplication
pub fn fingerprint(tx: &Transaction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tx.date.to_string().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(tx.category.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(round2(tx.amount).to_be_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(tx.note.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_row<W: Write>(writer: &mut csv::Writer<W>, tx: &Transaction) -> Result<()> {
    writer.write_record([
        tx.date.format("%Y-%m-%d").to_string(),
        tx.category.clone(),
        format!("{}", round2(tx.amount)),
        tx.note.clone(),
    ])?;
    Ok(())
}

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    category: Option<usize>,
    amount: usize,
    note: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            date: find("Date").ok_or_else(|| Error::InvalidData("Missing Date column".into()))?,
            category: find("Category"),
            amount: find("Amount")
                .ok_or_else(|| Error::InvalidData("Missing Amount column".into()))?,
            note: find("Note"),
        })
    }
}

/// Parse ledger CSV, returning usable rows and the number skipped
fn read_ledger<R: Read>(reader: R) -> Result<(Vec<Transaction>, usize)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok((Vec::new(), 0));
    }
    let columns = Columns::from_headers(&headers)?;

    let mut ledger = Vec::new();
    let mut skipped = 0;

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Skipping malformed ledger record");
                skipped += 1;
                continue;
            }
        };
        match parse_record(&record, &columns) {
            Some(tx) => ledger.push(tx),
            None => {
                debug!(?record, "Skipping unusable ledger row");
                skipped += 1;
            }
        }
    }

    Ok((ledger, skipped))
}

fn parse_record(record: &StringRecord, columns: &Columns) -> Option<Transaction> {
    let date = parse_date(record.get(columns.date)?)?;
    let amount: f64 = record.get(columns.amount)?.trim().parse().ok()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    let field = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let mut category = field(columns.category);
    if category.is_empty() {
        category = "Other".to_string();
    }

    Some(Transaction {
        date,
        category,
        amount,
        note: field(columns.note),
    })
}

/// Parse the date formats ledgers have been seen with
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
