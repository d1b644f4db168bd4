//! HTTP API integration tests, driving the router directly with
//! `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use platelog_core::analytics::{
    NamedCount, PlaceholderReference, ReferenceData, SystemHealth,
};
use platelog_core::{AiProvider, AiRequest, Database, Meal, User};
use platelog_server::{create_router, AppState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    admin: User,
    member: User,
}

fn test_app() -> TestApp {
    let db = Database::open_in_memory().expect("open db");
    db.migrate().expect("migrate");

    let mut admin = User::new("admin@example.com");
    admin.is_admin = true;
    db.upsert_user(&admin).expect("upsert admin");

    let member = User::new("member@example.com");
    db.upsert_user(&member).expect("upsert member");

    let now = Utc::now();
    let mut meal = Meal::new(&member.id, "lunch");
    meal.calories = Some(2000.0);
    meal.created_at = now;
    db.insert_meal(&meal).expect("insert meal");

    let mut req = AiRequest::new(&member.id, AiProvider::Gemini);
    req.confidence = Some(0.9);
    req.created_at = now - Duration::days(2);
    db.insert_ai_request(&req).expect("insert request");

    let router = create_router(AppState::new(db, PlaceholderReference));
    TestApp {
        router,
        admin,
        member,
    }
}

async fn send(router: &Router, uri: &str, user_id: Option<&str>) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("X-User-Id", id);
    }
    let request = builder.body(Body::empty()).expect("request");

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let (status, body) = send(&app.router, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_analytics_requires_identity() {
    let app = test_app();

    let (status, body) = send(&app.router, "/analytics", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Missing X-User-Id header");

    let (status, body) = send(&app.router, "/analytics", Some("nobody")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unknown user");
}

#[tokio::test]
async fn test_analytics_payload_shape() {
    let app = test_app();
    let (status, body) = send(&app.router, "/analytics", Some(&app.member.id)).await;
    assert_eq!(status, StatusCode::OK);

    // Defaults to the month range
    assert_eq!(body["range"], "month");
    assert_eq!(body["nutrition"]["total_meals_logged"], 1);
    assert_eq!(body["nutrition"]["calories_this_week"].as_array().map(Vec::len), Some(7));
    assert_eq!(body["ai_usage"]["total_requests"], 1);
    assert_eq!(body["ai_usage"]["gemini_requests"], 1);
    assert_eq!(body["goals"]["daily_calorie_goal"], 2000);
    assert_eq!(body["goals"]["streak"], 1);
    assert!(body["recipes"]["favorite_cuisines"].is_array());
}

#[tokio::test]
async fn test_analytics_range_selection() {
    let app = test_app();

    let (status, body) = send(&app.router, "/analytics?range=week", Some(&app.member.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["range"], "week");

    let (status, body) = send(&app.router, "/analytics?range=all", Some(&app.member.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["range"], "all");

    let (status, body) =
        send(&app.router, "/analytics?range=decade", Some(&app.member.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("decade"));
}

#[tokio::test]
async fn test_export_formats() {
    let app = test_app();

    let request = Request::builder()
        .uri("/analytics/export?format=csv")
        .header("X-User-Id", &app.member.id)
        .body(Body::empty())
        .expect("request");
    let response = app.router.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );
    let disposition = response.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.contains(".csv"));
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert!(std::str::from_utf8(&body).unwrap().starts_with("date,name,calories"));

    let (status, body) = send(
        &app.router,
        "/analytics/export?format=json",
        Some(&app.member.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "member@example.com");

    let (status, _) = send(
        &app.router,
        "/analytics/export?format=xml",
        Some(&app.member.id),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_gate() {
    let app = test_app();

    for uri in ["/admin/stats", "/admin/users"] {
        let (status, body) = send(&app.router, uri, Some(&app.member.id)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "expected 403 for {}", uri);
        assert_eq!(body["detail"], "Admin access required");

        let (status, _) = send(&app.router, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

/// Reference provider that counts every call it receives, delegating
/// the actual data to the placeholder.
struct CountingReference {
    calls: Arc<AtomicUsize>,
}

impl ReferenceData for CountingReference {
    fn favorite_cuisines(&self, user_id: &str) -> Vec<NamedCount> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PlaceholderReference.favorite_cuisines(user_id)
    }

    fn most_cooked(&self, user_id: &str) -> Vec<NamedCount> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PlaceholderReference.most_cooked(user_id)
    }

    fn system_health(&self) -> SystemHealth {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PlaceholderReference.system_health()
    }
}

#[tokio::test]
async fn test_admin_denial_short_circuits_before_assembly() {
    let db = Database::open_in_memory().expect("open db");
    db.migrate().expect("migrate");

    let mut admin = User::new("admin@example.com");
    admin.is_admin = true;
    db.upsert_user(&admin).expect("upsert admin");
    let member = User::new("member@example.com");
    db.upsert_user(&member).expect("upsert member");

    let calls = Arc::new(AtomicUsize::new(0));
    let reference = CountingReference {
        calls: calls.clone(),
    };
    let router = create_router(AppState::new(db, reference));

    // Denied requests never reach the stats assembler
    let (status, _) = send(&router, "/admin/stats", Some(&member.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&router, "/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // An admin request does, as a sanity check on the counter
    let (status, _) = send(&router, "/admin/stats", Some(&admin.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_admin_stats_payload() {
    let app = test_app();
    let (status, body) = send(&app.router, "/admin/stats", Some(&app.admin.id)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["users"]["total"], 2);
    assert!(body["revenue"]["monthly"].is_number());
    assert_eq!(body["ai_usage"]["total_requests"], 1);
    assert!(body["ai_usage"]["estimated_cost_this_month"].is_number());
    assert_eq!(body["system"]["status"], "healthy");
}

#[tokio::test]
async fn test_admin_user_list_pagination() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        "/admin/users?page=1&limit=1",
        Some(&app.admin.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    // Out-of-range values clamp rather than erroring
    let (status, body) = send(
        &app.router,
        "/admin/users?page=0&limit=9999",
        Some(&app.admin.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 100);
}

#[tokio::test]
async fn test_admin_user_detail() {
    let app = test_app();

    let uri = format!("/admin/users/{}", app.member.id);
    let (status, body) = send(&app.router, &uri, Some(&app.admin.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "member@example.com");
    assert_eq!(body["total_meals"], 1);
    assert_eq!(body["ai_usage"]["gemini_requests"], 1);

    let (status, body) = send(&app.router, "/admin/users/ghost", Some(&app.admin.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("ghost"));
}
