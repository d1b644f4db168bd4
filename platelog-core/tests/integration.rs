//! End-to-end integration tests: seed a database through the public API
//! and assemble full reports from it.

use chrono::{Duration, Utc};
use platelog_core::analytics::{
    build_admin_stats, build_admin_user_page, build_report, export_user_data, AnalyticsRange,
    ExportFormat, PageParams, PlaceholderReference,
};
use platelog_core::{AiProvider, AiRequest, Database, Meal, SubscriptionTier, User};

fn open_db() -> Database {
    let db = Database::open_in_memory().expect("open db");
    db.migrate().expect("migrate");
    db
}

fn meal(user_id: &str, calories: f64, days_ago: i64) -> Meal {
    let mut m = Meal::new(user_id, "meal");
    m.calories = Some(calories);
    m.protein = Some(35.0);
    m.carbs = Some(55.0);
    m.fat = Some(22.0);
    m.created_at = Utc::now() - Duration::days(days_ago);
    m
}

#[test]
fn test_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.db");

    let user = User::new("persist@example.com");
    {
        let db = Database::open(&path).expect("open");
        db.migrate().expect("migrate");
        db.upsert_user(&user).expect("upsert");
        db.insert_meal(&meal(&user.id, 640.0, 0)).expect("insert");
    }

    let db = Database::open(&path).expect("reopen");
    db.migrate().expect("migrate is idempotent");
    let loaded = db.get_user(&user.id).expect("query").expect("found");
    assert_eq!(loaded.email, "persist@example.com");

    let totals = db
        .meal_totals(&user.id, Utc::now() - Duration::days(1))
        .expect("totals");
    assert_eq!(totals.meal_count, 1);
}

#[test]
fn test_full_report_from_seeded_week() {
    let db = open_db();
    let now = Utc::now();
    let user = User::new("week@example.com");
    db.upsert_user(&user).expect("upsert");

    // Goal 2000 with a fully on-track trailing week
    let calories = [1920.0, 1780.0, 2100.0, 1850.0, 1950.0, 1720.0, 1890.0];
    for (i, c) in calories.iter().enumerate() {
        db.insert_meal(&meal(&user.id, *c, 6 - i as i64)).expect("insert");
    }

    let mut req = AiRequest::new(&user.id, AiProvider::Gemini);
    req.confidence = Some(0.92);
    req.created_at = now;
    db.insert_ai_request(&req).expect("insert request");

    let report = build_report(&db, &PlaceholderReference, &user, AnalyticsRange::Week, now)
        .expect("report");

    assert_eq!(report.range, "week");
    assert_eq!(report.nutrition.total_meals_logged, 7);
    assert_eq!(
        report.nutrition.calories_this_week,
        [1920, 1780, 2100, 1850, 1950, 1720, 1890]
    );
    assert_eq!(report.goals.days_on_track, 7);
    assert_eq!(report.goals.days_total, 7);
    assert_eq!(report.goals.streak, 7);
    assert_eq!(report.ai_usage.total_requests, 1);
    assert_eq!(report.ai_usage.gemini_requests, 1);

    // Wider ranges never shrink any total
    let month = build_report(&db, &PlaceholderReference, &user, AnalyticsRange::Month, now)
        .expect("report");
    let all = build_report(&db, &PlaceholderReference, &user, AnalyticsRange::All, now)
        .expect("report");
    assert!(month.nutrition.total_meals_logged >= report.nutrition.total_meals_logged);
    assert!(all.nutrition.total_meals_logged >= month.nutrition.total_meals_logged);
    assert!(all.ai_usage.total_requests >= month.ai_usage.total_requests);
}

#[test]
fn test_report_serializes_with_expected_keys() {
    let db = open_db();
    let user = User::new("shape@example.com");
    db.upsert_user(&user).expect("upsert");

    let report = build_report(
        &db,
        &PlaceholderReference,
        &user,
        AnalyticsRange::Month,
        Utc::now(),
    )
    .expect("report");

    let value = serde_json::to_value(&report).expect("serialize");
    for key in ["range", "ai_usage", "nutrition", "goals", "recipes"] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(value["nutrition"]["calories_this_week"].as_array().map(Vec::len), Some(7));
    assert_eq!(value["goals"]["days_total"], 1);
}

#[test]
fn test_admin_stats_and_pagination() {
    let db = open_db();
    let now = Utc::now();

    for i in 0..25 {
        let mut user = User::new(&format!("user-{:02}@example.com", i));
        user.created_at = now - Duration::days(i);
        if i % 5 == 0 {
            user.subscription_tier = SubscriptionTier::Premium;
        }
        user.last_login = Some(now - Duration::days(i));
        db.upsert_user(&user).expect("upsert");
    }

    let stats = build_admin_stats(&db, &PlaceholderReference, now).expect("stats");
    assert_eq!(stats.users.total, 25);
    assert_eq!(stats.users.premium, 5);
    assert_eq!(stats.users.active_last_30_days, 25);
    assert!(stats.revenue.monthly > 0.0);
    assert!((stats.revenue.annualized - stats.revenue.monthly * 12.0).abs() < 0.01);

    // page=2, limit=10 covers creation ranks 11 through 20
    let page = build_admin_user_page(&db, PageParams::new(2, 10), now).expect("page");
    assert_eq!(page.total, 25);
    assert_eq!(page.users.len(), 10);
    assert_eq!(page.users[0].email, "user-10@example.com");
    assert_eq!(page.users[9].email, "user-19@example.com");

    // Out-of-range parameters clamp instead of erroring
    let clamped = build_admin_user_page(&db, PageParams::new(0, 1000), now).expect("page");
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.users.len(), 25);
}

#[test]
fn test_export_round_trip() {
    let db = open_db();
    let user = User::new("roundtrip@example.com");
    db.upsert_user(&user).expect("upsert");
    db.insert_meal(&meal(&user.id, 480.0, 0)).expect("insert");

    let json = export_user_data(&db, &user, ExportFormat::Json, Utc::now()).expect("export");
    let value: serde_json::Value = serde_json::from_str(&json.body).expect("parse");
    assert_eq!(value["meals"][0]["calories"], 480.0);

    let csv = export_user_data(&db, &user, ExportFormat::Csv, Utc::now()).expect("export");
    assert_eq!(csv.body.lines().count(), 2);
}
