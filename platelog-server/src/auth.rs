//! Request identity extractors.
//!
//! Callers identify themselves with an `X-User-Id` header; the admin
//! extractor layers an authorization check on top so admin handlers
//! never run for non-admin callers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use platelog_core::User;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The authenticated user, verified to be an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?;

        let user = state
            .db
            .get_user(user_id)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "admin endpoint denied");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
