//! User command implementations (register, login, budget)

use anyhow::{bail, Context, Result};
use penny_core::{BudgetProvider, User};

use super::{display_name, App};

pub fn cmd_register(app: &App, user: Option<&str>, password: Option<&str>) -> Result<()> {
    let Some(username) = user else {
        bail!("Pass the new username with --user");
    };
    let Some(password) = password else {
        bail!("Pass a password with --password or set PENNY_PASSWORD");
    };

    let user = app.users.register(username, password)?;
    app.ledgers
        .initialize(Some(&user.username))
        .context("Failed to create ledger")?;

    println!("✅ Registered '{}'", user.username);
    println!(
        "   Monthly budget: {} (default, change with 'penny budget set')",
        app.money(app.config.default_monthly_budget)
    );
    Ok(())
}

pub fn cmd_login(app: &App, user: Option<&User>) -> Result<()> {
    let Some(user) = user else {
        bail!("Pass --user and --password to log in");
    };

    println!("✅ Logged in as '{}'", user.username);
    println!(
        "   Member since {}",
        user.created_at.format("%Y-%m-%d")
    );
    println!(
        "   Monthly budget: {}",
        app.money(app.monthly_budget(Some(user))?)
    );
    Ok(())
}

pub fn cmd_budget_show(app: &App, user: Option<&User>) -> Result<()> {
    let budget = app.monthly_budget(user)?;
    let source = match user {
        Some(u) if u.monthly_budget.is_some() => "saved",
        _ => "default",
    };

    println!(
        "💰 Monthly budget for {}: {} ({})",
        display_name(user),
        app.money(budget),
        source
    );
    Ok(())
}

pub fn cmd_budget_set(app: &App, user: Option<&User>, amount: f64) -> Result<()> {
    let Some(user) = user else {
        bail!(
            "Budgets are saved per user; pass --user (the guest ledger uses [budget] default_monthly from the config file)"
        );
    };

    app.users.set_budget(&user.username, amount)?;
    println!(
        "✅ Monthly budget for '{}' set to {}",
        user.username,
        app.money(amount)
    );
    Ok(())
}
