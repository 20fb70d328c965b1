use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use mediary_core::models::{ConfirmUploadRequest, UploadIntent, UploadRequest, UploadTicket};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::models::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Request a direct-upload capability
///
/// Validates the declared size, signs a time-limited PUT URL scoped to a
/// per-user storage key, and records the matching PENDING intent.
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Upload capability issued", body = UploadTicket),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 413, description = "Declared size exceeds the maximum", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %current.user.id, file_name = %request.file_name, operation = "request_upload")
)]
pub async fn request_upload(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let ticket = state
        .uploads
        .request_upload(&current.user.id, &request)
        .await?;

    Ok(Json(ticket))
}

/// Confirm a completed transfer
///
/// Moves the caller's own intent PENDING -> UPLOADED. The transfer claim is
/// trusted; existence is cross-checked later by the reconciliation sweep.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/confirm",
    tag = "uploads",
    request_body = ConfirmUploadRequest,
    responses(
        (status = 200, description = "Upload confirmed"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Intent belongs to another user", body = ErrorResponse),
        (status = 404, description = "Intent not found", body = ErrorResponse),
        (status = 409, description = "Intent is not pending", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %current.user.id, intent_id = request.intent_id, operation = "confirm_upload")
)]
pub async fn confirm_upload(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .uploads
        .confirm_upload(&current.user.id, request.intent_id)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUploadsQuery {
    /// Page size (default 50, max 200)
    pub limit: Option<i64>,
    /// Offset into the newest-first listing
    pub offset: Option<i64>,
}

/// List the caller's upload intents, newest first
#[utoipa::path(
    get,
    path = "/api/v0/uploads",
    tag = "uploads",
    params(ListUploadsQuery),
    responses(
        (status = 200, description = "Upload intents", body = [UploadIntent]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %current.user.id, operation = "list_uploads"))]
pub async fn list_uploads(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUploadsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let intents = state
        .uploads
        .list_for_user(&current.user.id, limit, offset)
        .await?;

    Ok(Json(intents))
}
