use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Upload intent status.
///
/// `PENDING` and `UPLOADED` belong to the request/confirm handoff; the rest
/// are owned by the downstream processing pipeline. Transitions are monotonic
/// and a row is never deleted, only terminalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "upload_status", rename_all = "UPPERCASE"))]
pub enum UploadStatus {
    Pending,
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    /// Legal forward transitions. An abandoned `PENDING` intent stays
    /// `PENDING` forever; the reconciliation sweep detects it by age.
    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        matches!(
            (self, next),
            (Pending, Uploaded)
                | (Uploaded, Processing)
                | (Uploaded, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

/// One client-initiated file transfer to object storage, tracked from the
/// capability request until the downstream pipeline terminalizes it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadIntent {
    pub id: i64,
    pub user_id: String,
    pub file_name: String,
    /// Unique, immutable after creation. Namespaced per user.
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: UploadStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new `PENDING` intent row
#[derive(Debug, Clone)]
pub struct NewUploadIntent {
    pub user_id: String,
    pub file_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Request for a direct-upload capability
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UploadRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Declared file size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size_bytes: u64,
}

/// Response containing the write capability and the intent it is tied to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadTicket {
    /// Time-limited presigned PUT URL
    pub upload_url: String,
    /// Intent id (used to confirm the upload)
    pub intent_id: i64,
    /// Storage key the capability is scoped to
    pub key: String,
    /// Capability expiration time
    pub expires_at: DateTime<Utc>,
}

/// Request to confirm a completed transfer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmUploadRequest {
    pub intent_id: i64,
}
