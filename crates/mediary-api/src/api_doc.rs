//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use mediary_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediary API",
        version = "0.1.0",
        description = "Media management API (v0): session-based authentication and direct-to-storage uploads via presigned URLs. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::health::health,
        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::logout,
        handlers::auth::logout_all,
        handlers::uploads::request_upload,
        handlers::uploads::confirm_upload,
        handlers::uploads::list_uploads,
    ),
    components(schemas(
        error::ErrorResponse,
        models::User,
        models::AccountTier,
        models::ExternalProfile,
        models::UploadRequest,
        models::UploadTicket,
        models::ConfirmUploadRequest,
        models::UploadIntent,
        models::UploadStatus,
    )),
    tags(
        (name = "health", description = "Service probes"),
        (name = "auth", description = "Session lifecycle"),
        (name = "uploads", description = "Direct-to-storage uploads")
    )
)]
pub struct ApiDoc;
