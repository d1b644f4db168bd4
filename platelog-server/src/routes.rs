//! HTTP route handlers.

use crate::auth::{AdminUser, CurrentUser};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use platelog_core::analytics::{
    self, AnalyticsRange, ExportFormat, PageParams, DEFAULT_PAGE_LIMIT,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

/// Build the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/analytics", get(analytics_handler))
        .route("/analytics/export", get(export_handler))
        .route("/admin/stats", get(admin_stats_handler))
        .route("/admin/users", get(admin_users_handler))
        .route("/admin/users/{id}", get(admin_user_detail_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.reference.system_health();
    Json(json!({
        "status": health.status,
        "database": health.database,
        "ai_service": health.ai_service,
    }))
}

#[derive(Debug, Deserialize)]
struct AnalyticsParams {
    range: Option<String>,
}

async fn analytics_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<analytics::AnalyticsReport>, ApiError> {
    let range = match params.range.as_deref() {
        Some(raw) => raw.parse::<AnalyticsRange>().map_err(ApiError::from)?,
        None => AnalyticsRange::default(),
    };

    tracing::debug!(user_id = %user.id, range = %range, "building analytics report");
    let report = analytics::build_report(
        &state.db,
        state.reference.as_ref(),
        &user,
        range,
        Utc::now(),
    )?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    format: Option<String>,
}

async fn export_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let format = match params.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>().map_err(ApiError::from)?,
        None => ExportFormat::default(),
    };

    let export = analytics::export_user_data(&state.db, &user, format, Utc::now())?;
    let headers = [
        (header::CONTENT_TYPE, export.format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];
    Ok((headers, export.body).into_response())
}

async fn admin_stats_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<analytics::AdminStats>, ApiError> {
    let stats = analytics::build_admin_stats(&state.db, state.reference.as_ref(), Utc::now())?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
struct UserListParams {
    page: Option<i64>,
    limit: Option<i64>,
}

async fn admin_users_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<analytics::AdminUserPage>, ApiError> {
    let page = PageParams::new(
        params.page.unwrap_or(1),
        params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );
    let result = analytics::build_admin_user_page(&state.db, page, Utc::now())?;
    Ok(Json(result))
}

async fn admin_user_detail_handler(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<analytics::AdminUserDetail>, ApiError> {
    let detail = analytics::build_admin_user_detail(&state.db, &id)?;
    Ok(Json(detail))
}
