//! Integration tests for penny-core
//!
//! These tests exercise the full store → load → insights workflow.

use chrono::NaiveDate;
use penny_core::{
    insights::{
        budget_status, detect_anomalies, forecast_next_month, recommend_category_budgets,
        savings_opportunities, BudgetLevel, ModelKind,
    },
    store::{BudgetProvider, LedgerProvider},
    test_utils::temp_stores,
    AnalysisContext, Error, InsightEngine, InsightType, LedgerStore, NewTransaction,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_tx(on: NaiveDate, category: &str, amount: f64) -> NewTransaction {
    NewTransaction {
        date: on,
        category: category.to_string(),
        amount,
        note: String::new(),
    }
}

/// Ledger CSV with a year of steady bills, groceries and one large purchase
fn year_of_spending_csv() -> String {
    let mut csv = String::from("Date,Category,Amount,Note\n");
    for month in 1..=12 {
        csv.push_str(&format!("2023-{:02}-01,Bills,1000,rent\n", month));
        csv.push_str(&format!("2023-{:02}-15,Food,1000,groceries\n", month));
    }
    csv.push_str("2023-12-20,Shopping,9000,laptop\n");
    csv
}

// =============================================================================
// Store Integration Tests
// =============================================================================

#[test]
fn test_append_load_remove_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path());

    store.initialize(Some("alice")).unwrap();
    assert!(store.load(Some("alice")).unwrap().is_empty());

    store
        .append(Some("alice"), new_tx(date(2024, 1, 5), "Food", 12.346))
        .unwrap();
    store
        .append(Some("alice"), new_tx(date(2024, 1, 6), "Travel", 80.0))
        .unwrap();
    store
        .append(Some("alice"), new_tx(date(2024, 1, 2), "Bills", 300.0))
        .unwrap();

    let ledger = store.load_ledger(Some("alice")).unwrap();
    assert_eq!(ledger.len(), 3);
    // Insertion order, not date order
    assert_eq!(ledger[2].category, "Bills");
    assert_eq!(ledger[0].amount, 12.35);

    let removed = store.remove(Some("alice"), 1).unwrap();
    assert_eq!(removed.category, "Travel");

    let ledger = store.load(Some("alice")).unwrap();
    let categories: Vec<&str> = ledger.iter().map(|t| t.category.as_str()).collect();
    assert_eq!(categories, vec!["Food", "Bills"]);

    // Guest ledger is separate
    assert!(store.load(None).unwrap().is_empty());
}

#[test]
fn test_import_dedup_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path());

    let stats = store
        .import(Some("bob"), year_of_spending_csv().as_bytes())
        .unwrap();
    assert_eq!(stats.imported, 25);
    assert_eq!(stats.duplicates, 0);

    // Importing again should skip all
    let stats = store
        .import(Some("bob"), year_of_spending_csv().as_bytes())
        .unwrap();
    assert_eq!(stats.imported, 0);
    assert_eq!(stats.duplicates, 25);

    let mut out = Vec::new();
    let count = store.export(Some("bob"), &mut out).unwrap();
    assert_eq!(count, 25);

    // Exported file imports cleanly into another user's ledger
    let stats = store.import(Some("carol"), out.as_slice()).unwrap();
    assert_eq!(stats.imported, 25);
    assert_eq!(
        store.load(Some("bob")).unwrap(),
        store.load(Some("carol")).unwrap()
    );
}

#[test]
fn test_user_budget_roundtrip() {
    let (dir, _ledgers, users) = temp_stores();
    assert!(dir.path().join("users.db").exists());

    users.register("alice", "s3cret").unwrap();
    assert!(matches!(
        users.register("alice", "other"),
        Err(Error::UserExists(_))
    ));

    assert!(users.login("alice", "s3cret").unwrap().is_some());
    assert!(users.login("alice", "wrong").unwrap().is_none());

    assert_eq!(users.get_budget("alice").unwrap(), None);
    users.set_budget("alice", 2500.0).unwrap();
    assert_eq!(users.get_budget("alice").unwrap(), Some(2500.0));

    assert!(users.set_budget("alice", 0.0).is_err());
    assert!(users.set_budget("nobody", 100.0).is_err());
}

// =============================================================================
// Store → Insights Workflow
// =============================================================================

#[test]
fn test_imported_ledger_through_insights() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path());
    store
        .import(Some("dana"), year_of_spending_csv().as_bytes())
        .unwrap();
    let ledger = store.load(Some("dana")).unwrap();

    let forecast = forecast_next_month(&ledger);
    assert_eq!(forecast.monthly.len(), 12);
    let prediction = forecast.prediction.expect("twelve months should forecast");
    assert_eq!(prediction.model, ModelKind::TreeEnsemble);
    assert_eq!(prediction.period.to_string(), "2024-01");
    assert!(prediction.amount >= 0.0);
    assert!(prediction.interval.lower >= 0.0);
    assert!(prediction.interval.upper >= prediction.amount);

    let anomalies = detect_anomalies(&ledger);
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].transaction.note, "laptop");
    assert_eq!(anomalies[0].position, 24);

    let recs = recommend_category_budgets(&ledger, 3300.0);
    assert_eq!(recs.len(), 3);
    let sum: f64 = recs.values().sum();
    assert!((sum - 3300.0).abs() < 0.05);

    // Bills and Food are 12000 each of 33000 (36.4%), Shopping 27.3%
    let savings = savings_opportunities(&ledger);
    let names: Vec<&str> = savings.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, vec!["Bills", "Food"]);

    let status = budget_status(&ledger, 5000.0, date(2024, 3, 15));
    assert_eq!(status.current_total, 0.0);
    assert_eq!(status.level, BudgetLevel::Excellent);
}

#[test]
fn test_engine_over_stored_ledger() {
    let (_dir, store, users) = temp_stores();
    users.register("erin", "pw").unwrap();
    users.set_budget("erin", 500.0).unwrap();

    let today = date(2024, 6, 20);
    for day in 1..=20 {
        store
            .append(Some("erin"), new_tx(date(2024, 6, day), "Food", 40.0))
            .unwrap();
    }

    let ledger = store.load(Some("erin")).unwrap();
    let budget = users.get_budget("erin").unwrap().unwrap();
    let ctx = AnalysisContext::new(&ledger, budget, today);
    let findings = InsightEngine::new().analyze_all(&ctx);

    // 800 spent against 500: the budget finding leads
    assert_eq!(findings[0].insight_type, InsightType::BudgetStatus);
    assert_eq!(findings[0].data["level"], "exceeded");
    for pair in findings.windows(2) {
        assert!(pair[0].severity.priority() >= pair[1].severity.priority());
    }
}

#[test]
fn test_bad_rows_are_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("expenses_guest.csv");
    std::fs::write(
        &path,
        "Date,Category,Amount,Note\n\
         2024-01-01,Food,10,ok\n\
         not-a-date,Food,10,bad date\n\
         2024-01-02,Food,abc,bad amount\n\
         2024-01-03,Food,-4,negative\n\
         2024-01-04,Bills,20,\n",
    )
    .unwrap();

    let store = LedgerStore::new(dir.path());
    let ledger = store.load(None).unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1].category, "Bills");
}
