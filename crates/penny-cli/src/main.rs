//! Penny CLI - Personal expense tracker
//!
//! Usage:
//!   penny init                               Create data directory and ledger
//!   penny --user me register                 Create a user (password via PENNY_PASSWORD)
//!   penny add -c Food -a 12.50               Record an expense
//!   penny status                             This month against the budget
//!   penny dashboard                          All insights, most urgent first

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so `export` and `--json` output stay clean
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let app = commands::open_app(cli.config.as_deref(), cli.data_dir.as_deref())?;

    // Registration runs before the user exists, everything else authenticates
    let user = match cli.command {
        Commands::Register => None,
        _ => commands::authenticate(&app, cli.user.as_deref(), cli.password.as_deref())?,
    };
    let user = user.as_ref();

    match cli.command {
        Commands::Register => {
            commands::cmd_register(&app, cli.user.as_deref(), cli.password.as_deref())
        }
        Commands::Init => commands::cmd_init(&app, user),
        Commands::Login => commands::cmd_login(&app, user),
        Commands::Add {
            date,
            category,
            amount,
            note,
        } => commands::cmd_add(&app, user, date.as_deref(), &category, amount, &note),
        Commands::List { category, limit } => {
            commands::cmd_list(&app, user, category.as_deref(), limit)
        }
        Commands::Remove { position } => commands::cmd_remove(&app, user, position),
        Commands::Import { file } => commands::cmd_import(&app, user, &file),
        Commands::Export { file } => commands::cmd_export(&app, user, file.as_deref()),
        Commands::Budget { action } => match action {
            None => commands::cmd_budget_show(&app, user),
            Some(BudgetAction::Set { amount }) => commands::cmd_budget_set(&app, user, amount),
        },
        Commands::Status => commands::cmd_status(&app, user, cli.json),
        Commands::Forecast => commands::cmd_forecast(&app, user, cli.json),
        Commands::Anomalies => commands::cmd_anomalies(&app, user, cli.json),
        Commands::Patterns => commands::cmd_patterns(&app, user, cli.json),
        Commands::Recommend { total } => commands::cmd_recommend(&app, user, total, cli.json),
        Commands::Savings => commands::cmd_savings(&app, user, cli.json),
        Commands::Trend => commands::cmd_trend(&app, user, cli.json),
        Commands::Dashboard => commands::cmd_dashboard(&app, user, cli.json),
    }
}
