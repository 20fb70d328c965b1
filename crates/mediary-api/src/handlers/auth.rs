use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};
use mediary_core::models::{ExternalProfile, User};
use mediary_core::AppError;
use validator::Validate;

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::models::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

fn set_cookie_headers(cookie: &str) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(format!("Invalid cookie header: {}", e)))?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

/// Complete a login from a verified external profile
///
/// The identity-provider handshake happens upstream; this endpoint receives
/// the verified profile, resolves the local user, and sets the session cookie.
#[utoipa::path(
    post,
    path = "/api/v0/auth/login",
    tag = "auth",
    request_body = ExternalProfile,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = User),
        (status = 400, description = "Invalid profile", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, profile), fields(operation = "login"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<ExternalProfile>,
) -> Result<impl IntoResponse, HttpAppError> {
    profile.validate().map_err(AppError::from)?;

    let (user, session) = state.login.login_from_external(&profile).await?;

    let headers = set_cookie_headers(&session_cookie(
        &state.config.session.cookie_name,
        &session.token,
        session.expires_at,
        state.config.session.cookie_secure,
    ))?;

    Ok((headers, Json(user)))
}

/// Current authenticated user
#[utoipa::path(
    get,
    path = "/api/v0/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

/// Log out the current session
#[utoipa::path(
    post,
    path = "/api/v0/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session invalidated, cookie cleared"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, current), fields(user_id = %current.user.id, operation = "logout"))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .sessions
        .invalidate_session(&current.session.token)
        .await?;

    let headers = set_cookie_headers(&clear_session_cookie(
        &state.config.session.cookie_name,
        state.config.session.cookie_secure,
    ))?;

    Ok((headers, Json(serde_json::json!({ "success": true }))))
}

/// Log out everywhere: invalidate every session of the current user
#[utoipa::path(
    post,
    path = "/api/v0/auth/logout-all",
    tag = "auth",
    responses(
        (status = 200, description = "All sessions invalidated, cookie cleared"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, current), fields(user_id = %current.user.id, operation = "logout_all"))]
pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let invalidated = state
        .sessions
        .invalidate_all_user_sessions(&current.user.id)
        .await?;

    let headers = set_cookie_headers(&clear_session_cookie(
        &state.config.session.cookie_name,
        state.config.session.cookie_secure,
    ))?;

    Ok((
        headers,
        Json(serde_json::json!({ "success": true, "invalidated": invalidated })),
    ))
}
