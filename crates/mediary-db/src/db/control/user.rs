use async_trait::async_trait;
use mediary_core::models::{ExternalProfile, NewUser, User};
use mediary_core::AppError;
use sqlx::{PgPool, Postgres};

/// Persistence seam for user rows.
///
/// `insert` must report a duplicate external id or email as
/// `AppError::Conflict` so the identity resolver can recover from a
/// concurrent first-login by re-reading instead of failing.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError>;

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Refresh mutable profile fields and stamp `last_login_at`.
    /// Never touches `id` or `external_id`.
    async fn update_profile(&self, user_id: &str, profile: &ExternalProfile)
        -> Result<(), AppError>;
}

/// Postgres-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT * FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get user by id");
            AppError::Database(e)
        })?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT * FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get user by external id");
            AppError::Database(e)
        })?;

        Ok(user)
    }

    #[tracing::instrument(
        skip(self, new_user),
        fields(db.table = "users", db.operation = "insert")
    )]
    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, external_id, email, name, picture_url, tier)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&new_user.id)
        .bind(&new_user.external_id)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.picture_url)
        .bind(new_user.tier)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(
                format!("User already exists for external id {}", new_user.external_id),
            ),
            _ => {
                tracing::error!(error = %e, "Failed to insert user");
                AppError::Database(e)
            }
        })?;

        tracing::info!(user_id = %user.id, "User created");

        Ok(user)
    }

    #[tracing::instrument(
        skip(self, profile),
        fields(db.table = "users", db.operation = "update")
    )]
    async fn update_profile(
        &self,
        user_id: &str,
        profile: &ExternalProfile,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, picture_url = $3, last_login_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .bind(&profile.picture_url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to update user profile");
            AppError::Database(e)
        })?;

        Ok(())
    }
}
