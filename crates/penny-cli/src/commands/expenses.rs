//! Expense command implementations (add, list, remove, import, export)

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use penny_core::insights::total_spent;
use penny_core::store::parse_date;
use penny_core::{NewTransaction, User, DEFAULT_CATEGORIES};

use super::{display_name, truncate, username, App};

pub fn cmd_add(
    app: &App,
    user: Option<&User>,
    date: Option<&str>,
    category: &str,
    amount: f64,
    note: &str,
) -> Result<()> {
    let date = match date {
        Some(s) => match parse_date(s) {
            Some(d) => d,
            None => bail!("Invalid date '{}' (use YYYY-MM-DD)", s),
        },
        None => Local::now().date_naive(),
    };

    let category = category.trim();
    if !DEFAULT_CATEGORIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(category))
    {
        tracing::debug!(category, "Using custom category");
    }

    let tx = app.ledgers.append(
        username(user),
        NewTransaction {
            date,
            category: category.to_string(),
            amount,
            note: note.to_string(),
        },
    )?;

    println!(
        "✅ Added {} for {} on {}",
        app.money(tx.amount),
        tx.category,
        tx.date
    );
    Ok(())
}

pub fn cmd_list(
    app: &App,
    user: Option<&User>,
    category: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let ledger = app.ledger(user)?;

    if ledger.is_empty() {
        println!("No expenses recorded yet. Add one with:");
        println!("  penny add --category Food --amount 12.50");
        return Ok(());
    }

    // Positions stay those of the full ledger so they can be passed to `remove`
    let mut rows: Vec<(usize, _)> = ledger
        .iter()
        .enumerate()
        .filter(|(_, tx)| category.map_or(true, |c| tx.category == c))
        .collect();

    if let Some(limit) = limit {
        let skip = rows.len().saturating_sub(limit);
        rows.drain(..skip);
    }

    println!();
    match category {
        Some(c) => println!("📝 {} expenses for {}", c, display_name(user)),
        None => println!("📝 Expenses for {}", display_name(user)),
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if rows.is_empty() {
        println!("   (none)");
        return Ok(());
    }

    for (position, tx) in &rows {
        println!(
            "   {:>4} │ {} │ {:<10} │ {:>14} │ {}",
            position + 1,
            tx.date,
            truncate(&tx.category, 10),
            app.money(tx.amount),
            truncate(&tx.note, 30)
        );
    }

    let shown: Vec<_> = rows.iter().map(|(_, tx)| (*tx).clone()).collect();
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total: {}", app.money(total_spent(&shown)));

    Ok(())
}

pub fn cmd_remove(app: &App, user: Option<&User>, position: usize) -> Result<()> {
    if position == 0 {
        bail!("Positions start at 1 (see 'penny list')");
    }

    let removed = app.ledgers.remove(username(user), position - 1)?;
    println!(
        "🗑️  Removed #{}: {} {} on {}",
        position,
        removed.category,
        app.money(removed.amount),
        removed.date
    );
    Ok(())
}

pub fn cmd_import(app: &App, user: Option<&User>, file: &Path) -> Result<()> {
    println!("📥 Importing {}...", file.display());

    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let stats = app.ledgers.import(username(user), reader)?;

    println!("   Imported: {}", stats.imported);
    if stats.duplicates > 0 {
        println!("   Skipped (already recorded): {}", stats.duplicates);
    }
    if stats.invalid > 0 {
        println!("   ⚠️  Skipped (unreadable rows): {}", stats.invalid);
    }
    println!("✅ Import complete");
    Ok(())
}

pub fn cmd_export(app: &App, user: Option<&User>, file: Option<&Path>) -> Result<()> {
    match file {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let count = app.ledgers.export(username(user), BufWriter::new(out))?;
            println!("✅ Exported {} expenses to {}", count, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            app.ledgers.export(username(user), &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}
