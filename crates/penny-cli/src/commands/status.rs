//! Status-related command implementations (budget status, dashboard)

use anyhow::Result;
use penny_core::insights::{budget_status_now, total_spent, BudgetLevel};
use penny_core::{AnalysisContext, InsightEngine, Severity, User};

use super::{display_name, print_json, App};

/// Width of the text progress bar
const BAR_WIDTH: usize = 30;

fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round();
    let filled = filled.clamp(0.0, BAR_WIDTH as f64) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Alert => "🔴",
        Severity::Warning => "🟠",
        Severity::Attention => "🟡",
        Severity::Info => "🔵",
    }
}

pub fn cmd_status(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let budget = app.monthly_budget(user)?;
    let status = budget_status_now(&ledger, budget);

    if json {
        return print_json(&status);
    }

    let icon = match status.level {
        BudgetLevel::Exceeded => "🚨",
        BudgetLevel::ProjectedToExceed | BudgetLevel::HighUsage => "⚠️ ",
        BudgetLevel::OnTrack => "👍",
        BudgetLevel::Excellent => "🌟",
    };

    println!();
    println!("📊 Budget for {} ({})", display_name(user), status.period);
    println!("   ─────────────────────────────────────────────");
    println!("   Budget:     {}", app.money(status.budget));
    println!("   Spent:      {}", app.money(status.current_total));
    println!("   Projected:  {}", app.money(status.projected_total));
    println!(
        "   {} {:.1}%",
        progress_bar(status.percentage),
        status.percentage
    );
    println!();
    println!("   {} {}", icon, status.message);

    Ok(())
}

pub fn cmd_dashboard(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let budget = app.monthly_budget(user)?;
    let ctx = AnalysisContext::today(&ledger, budget);
    let findings = InsightEngine::new().analyze_all(&ctx);

    if json {
        return print_json(&findings);
    }

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│           💰 Penny Dashboard            │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  User:            {}", display_name(user));
    println!("  Expenses:        {}", ledger.len());
    println!("  Total spent:     {}", app.money(total_spent(&ledger)));
    println!("  Monthly budget:  {}", app.money(budget));
    println!();

    for finding in &findings {
        println!(
            "  {} {} - {}",
            severity_icon(finding.severity),
            finding.title,
            finding.summary
        );
        if let Some(detail) = &finding.detail {
            println!("     {}", detail);
        }
    }

    let urgent = findings
        .iter()
        .filter(|f| f.severity.priority() >= Severity::Warning.priority())
        .count();
    if urgent > 0 {
        println!();
        println!("  {} finding(s) need attention.", urgent);
    }

    Ok(())
}
