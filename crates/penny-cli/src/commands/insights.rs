//! Insight command implementations (forecast, anomalies, patterns, recommend, savings, trend)

use anyhow::Result;
use penny_core::insights::{
    analyze_patterns, category_summary, detect_anomalies, forecast_next_month,
    predict_next_expense, recommend_category_budgets, savings_opportunities, spending_trend,
    SpendingTrend,
};
use penny_core::User;
use serde_json::json;

use super::{print_json, truncate, App};

pub fn cmd_forecast(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let result = forecast_next_month(&ledger);

    if json {
        return print_json(&result);
    }

    if result.is_empty() {
        println!("No expenses recorded yet, nothing to forecast.");
        return Ok(());
    }

    println!();
    println!("📈 Monthly Spending");
    println!("   ─────────────────────────────────────────────");
    for month in &result.monthly {
        println!(
            "   {} │ {:>14} │ {:>3} expenses │ avg {}",
            month.period,
            app.money(month.total),
            month.count,
            app.money(month.mean)
        );
    }

    println!();
    match &result.prediction {
        Some(forecast) => {
            println!("🔮 Forecast for {}", forecast.period);
            println!("   Expected: {}", app.money(forecast.amount));
            println!(
                "   95% range: {} - {}",
                app.money(forecast.interval.lower),
                app.money(forecast.interval.upper)
            );
            println!("   Model: {}", forecast.model);

            let budget = app.monthly_budget(user)?;
            if forecast.amount > budget {
                println!(
                    "   ⚠️  Above your monthly budget of {}",
                    app.money(budget)
                );
            }
        }
        None => {
            println!("🔮 Need at least two months of expenses to forecast.");
        }
    }

    Ok(())
}

pub fn cmd_anomalies(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let anomalies = detect_anomalies(&ledger);

    if json {
        return print_json(&anomalies);
    }

    if ledger.len() < 10 {
        println!(
            "Need at least 10 expenses to look for anomalies ({} so far).",
            ledger.len()
        );
        return Ok(());
    }

    if anomalies.is_empty() {
        println!("✅ No unusual expenses found.");
        return Ok(());
    }

    println!();
    println!("🚨 Unusual Expenses");
    println!("   ─────────────────────────────────────────────────────────────");
    for anomaly in &anomalies {
        let tx = &anomaly.transaction;
        println!(
            "   {:>4} │ {} │ {:<10} │ {:>14} │ z = {:.2}",
            anomaly.position + 1,
            tx.date,
            truncate(&tx.category, 10),
            app.money(tx.amount),
            anomaly.z_score
        );
    }

    Ok(())
}

pub fn cmd_patterns(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let patterns = analyze_patterns(&ledger);

    if json {
        return print_json(&patterns);
    }

    if ledger.is_empty() {
        println!("No expenses recorded yet.");
        return Ok(());
    }

    println!();
    println!("📅 By Day of Week (average per expense)");
    println!("   ─────────────────────────────────────────────");
    for day in &patterns.by_weekday {
        println!(
            "   {:<10} │ {:>14} │ {} expenses",
            day.weekday,
            app.money(day.mean),
            day.count
        );
    }
    println!();
    println!("   Weekdays: {}", app.money(patterns.weekday_mean));
    println!("   Weekends: {}", app.money(patterns.weekend_mean));

    println!();
    println!("🏷️  By Category");
    println!("   ─────────────────────────────────────────────");
    for total in category_summary(&ledger) {
        if let Some(stats) = patterns.by_category.get(&total.category) {
            println!(
                "   {:<10} │ {:>14} │ avg {} │ {} expenses",
                truncate(&total.category, 10),
                app.money(stats.total),
                app.money(stats.mean),
                stats.count
            );
        }
    }

    Ok(())
}

pub fn cmd_recommend(
    app: &App,
    user: Option<&User>,
    total: Option<f64>,
    json: bool,
) -> Result<()> {
    let ledger = app.ledger(user)?;
    let total = match total {
        Some(t) => t,
        None => app.monthly_budget(user)?,
    };
    let recommendations = recommend_category_budgets(&ledger, total);

    if json {
        return print_json(&json!({
            "total": total,
            "recommendations": recommendations,
        }));
    }

    if recommendations.is_empty() {
        println!("Not enough spending history to recommend a split.");
        return Ok(());
    }

    println!();
    println!("🧮 Suggested split of {}", app.money(total));
    println!("   ─────────────────────────────────────────────");

    let mut rows: Vec<(&String, &f64)> = recommendations.iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (category, amount) in rows {
        println!(
            "   {:<10} │ {:>14}",
            truncate(category, 10),
            app.money(*amount)
        );
    }

    Ok(())
}

pub fn cmd_savings(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let opportunities = savings_opportunities(&ledger);

    if json {
        return print_json(&opportunities);
    }

    if opportunities.is_empty() {
        println!("✅ No single category dominates your spending.");
        return Ok(());
    }

    println!();
    println!("💸 Savings Potential");
    println!("   ─────────────────────────────────────────────");
    let mut potential = 0.0;
    for opp in &opportunities {
        println!(
            "   {:<10} │ {:>5.1}% of spending │ cut 15% to save {}",
            truncate(&opp.category, 10),
            opp.share_percent,
            app.money(opp.suggested_savings)
        );
        potential += opp.suggested_savings;
    }
    println!();
    println!("   Total potential savings: {}", app.money(potential));

    Ok(())
}

pub fn cmd_trend(app: &App, user: Option<&User>, json: bool) -> Result<()> {
    let ledger = app.ledger(user)?;
    let next = predict_next_expense(&ledger);
    let trend = spending_trend(&ledger);

    if json {
        return print_json(&json!({
            "next_expense": next,
            "trend": trend,
        }));
    }

    match next {
        Some(amount) => println!("🔮 Next expense is likely around {}", app.money(amount)),
        None => println!("No expenses recorded yet."),
    }

    let arrow = match trend {
        SpendingTrend::Increasing => "📈 Spending is going up",
        SpendingTrend::Decreasing => "📉 Spending is going down",
        SpendingTrend::Stable => "➡️  Spending is steady",
        SpendingTrend::InsufficientData => "   Need at least two expenses to see a trend",
    };
    println!("{}", arrow);

    Ok(())
}
