use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediary_core::models::{Session, User};
use mediary_core::AppError;
use sqlx::{PgPool, Row};

/// Persistence seam for session rows.
///
/// Every mutation is a single-row, single-statement transaction. The store is
/// the sole authority on session validity; callers never cache the result.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), AppError>;

    /// Look up a session by token, joined with its owning user.
    /// Token lookup is an indexed equality comparison on the primary key.
    async fn find_with_user(&self, token: &str) -> Result<Option<(Session, User)>, AppError>;

    /// Slide the absolute expiry forward in place. Concurrent renewals race
    /// harmlessly: both writers compute an equivalent new deadline and the
    /// row's last write wins.
    async fn update_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Delete one session. Deleting an absent token is not an error.
    async fn delete(&self, token: &str) -> Result<(), AppError>;

    /// Delete every session owned by a user ("log out everywhere").
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError>;

    /// Hygiene only: correctness comes from lazy expiry at validation time.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Postgres-backed session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    #[tracing::instrument(
        skip(self, session),
        fields(db.table = "user_sessions", db.operation = "insert", user_id = %session.user_id)
    )]
    async fn insert(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert session");
            AppError::Database(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(
        skip(self, token),
        fields(db.table = "user_sessions", db.operation = "select")
    )]
    async fn find_with_user(&self, token: &str) -> Result<Option<(Session, User)>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                s.token, s.user_id, s.expires_at,
                u.id, u.external_id, u.email, u.name, u.picture_url,
                u.tier, u.last_login_at, u.created_at, u.updated_at
            FROM user_sessions s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up session");
            AppError::Database(e)
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let session = Session {
            token: row.get("token"),
            user_id: row.get("user_id"),
            expires_at: row.get("expires_at"),
        };
        let user = User {
            id: row.get("id"),
            external_id: row.get("external_id"),
            email: row.get("email"),
            name: row.get("name"),
            picture_url: row.get("picture_url"),
            tier: row.get("tier"),
            last_login_at: row.get("last_login_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };

        Ok(Some((session, user)))
    }

    #[tracing::instrument(
        skip(self, token),
        fields(db.table = "user_sessions", db.operation = "update")
    )]
    async fn update_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE user_sessions
            SET expires_at = $2
            WHERE token = $1
            "#,
        )
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to renew session");
            AppError::Database(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(
        skip(self, token),
        fields(db.table = "user_sessions", db.operation = "delete")
    )]
    async fn delete(&self, token: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to delete session");
            AppError::Database(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_sessions", db.operation = "delete"))]
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to delete user sessions");
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_sessions", db.operation = "delete"))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to delete expired sessions");
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }
}
