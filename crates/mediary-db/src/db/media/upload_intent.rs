use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediary_core::models::{NewUploadIntent, UploadIntent, UploadStatus};
use mediary_core::AppError;
use sqlx::{PgPool, Postgres};

/// Persistence seam for the upload intent ledger.
///
/// Rows are inserted in `PENDING` and only ever moved forward through the
/// status enum; nothing here deletes a row, so the ledger stays a complete
/// audit trail and the reconciliation sweep's work list.
#[async_trait]
pub trait UploadIntentStore: Send + Sync {
    async fn insert_pending(&self, new_intent: NewUploadIntent) -> Result<UploadIntent, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadIntent>, AppError>;

    /// Compare-and-set status transition: the row moves from `from` to `to`
    /// in one guarded statement. Returns false when the row was not in
    /// `from`, which callers surface as a conflict rather than retrying.
    async fn transition(
        &self,
        id: i64,
        from: UploadStatus,
        to: UploadStatus,
        error_message: Option<String>,
    ) -> Result<bool, AppError>;

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadIntent>, AppError>;

    /// Read-only query consumed by the external reconciliation sweep:
    /// intents stuck in `PENDING` since before `older_than`.
    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<UploadIntent>, AppError>;
}

/// Postgres-backed upload intent repository
#[derive(Clone)]
pub struct UploadIntentRepository {
    pool: PgPool,
}

impl UploadIntentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadIntentStore for UploadIntentRepository {
    #[tracing::instrument(
        skip(self, new_intent),
        fields(db.table = "upload_intents", db.operation = "insert", user_id = %new_intent.user_id)
    )]
    async fn insert_pending(&self, new_intent: NewUploadIntent) -> Result<UploadIntent, AppError> {
        let intent = sqlx::query_as::<Postgres, UploadIntent>(
            r#"
            INSERT INTO upload_intents (
                user_id, file_name, storage_key, content_type, size_bytes, status
            )
            VALUES ($1, $2, $3, $4, $5, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(&new_intent.user_id)
        .bind(&new_intent.file_name)
        .bind(&new_intent.storage_key)
        .bind(&new_intent.content_type)
        .bind(new_intent.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert upload intent");
            AppError::Database(e)
        })?;

        tracing::info!(
            intent_id = intent.id,
            storage_key = %intent.storage_key,
            "Upload intent created"
        );

        Ok(intent)
    }

    #[tracing::instrument(skip(self), fields(db.table = "upload_intents", db.operation = "select"))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UploadIntent>, AppError> {
        let intent = sqlx::query_as::<Postgres, UploadIntent>(
            r#"
            SELECT * FROM upload_intents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get upload intent");
            AppError::Database(e)
        })?;

        Ok(intent)
    }

    #[tracing::instrument(skip(self), fields(db.table = "upload_intents", db.operation = "update"))]
    async fn transition(
        &self,
        id: i64,
        from: UploadStatus,
        to: UploadStatus,
        error_message: Option<String>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE upload_intents
            SET status = $3, error_message = $4, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to transition upload intent");
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "upload_intents", db.operation = "select"))]
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadIntent>, AppError> {
        let intents = sqlx::query_as::<Postgres, UploadIntent>(
            r#"
            SELECT * FROM upload_intents
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list upload intents");
            AppError::Database(e)
        })?;

        Ok(intents)
    }

    #[tracing::instrument(skip(self), fields(db.table = "upload_intents", db.operation = "select"))]
    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<UploadIntent>, AppError> {
        let intents = sqlx::query_as::<Postgres, UploadIntent>(
            r#"
            SELECT * FROM upload_intents
            WHERE status = 'PENDING' AND created_at < $1
            ORDER BY created_at
            "#,
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list stale pending intents");
            AppError::Database(e)
        })?;

        Ok(intents)
    }
}
