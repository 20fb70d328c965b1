//! Session lifecycle: the sole authority for "is this caller authenticated."
//!
//! Sessions use lazy expiry: an expired row is detected and deleted at
//! validation time, so no background reaper is required for correctness.
//! Active sessions slide forward with a deadband — a renewal write happens
//! only when less than the threshold remains, not on every validation.

use std::sync::Arc;

use chrono::Utc;
use mediary_core::models::{Session, User};
use mediary_core::{generate_session_token, AppError, SessionConfig};
use mediary_db::SessionStore;

/// Outcome of a successful validation.
///
/// `renewed` tells the HTTP layer to refresh the client-side cookie so its
/// expiry keeps mirroring the stored one.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session: Session,
    pub user: User,
    pub renewed: bool,
}

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { sessions, config }
    }

    /// Issue a new session for a logged-in user. One per login event;
    /// concurrent sessions for the same user are independent rows.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn create_session(&self, user_id: &str) -> Result<Session, AppError> {
        let session = Session {
            token: generate_session_token(),
            user_id: user_id.to_string(),
            expires_at: Utc::now() + self.config.duration(),
        };
        self.sessions.insert(&session).await?;

        tracing::info!(user_id = %user_id, "Session created");

        Ok(session)
    }

    /// Validate an attacker-suppliable token.
    ///
    /// Returns `None` for both "unknown token" and "expired" — not being
    /// logged in is normal control flow, not a fault. Expired sessions are
    /// deleted as a side effect and stay gone.
    #[tracing::instrument(skip(self, token))]
    pub async fn validate_session(
        &self,
        token: &str,
    ) -> Result<Option<ValidatedSession>, AppError> {
        let Some((mut session, user)) = self.sessions.find_with_user(token).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.is_expired(now) {
            self.sessions.delete(token).await?;
            tracing::debug!(user_id = %user.id, "Expired session deleted at validation");
            return Ok(None);
        }

        let mut renewed = false;
        if session.needs_renewal(now, self.config.renewal_threshold()) {
            let new_expiry = now + self.config.duration();
            self.sessions.update_expiry(token, new_expiry).await?;
            session.expires_at = new_expiry;
            renewed = true;
            tracing::debug!(user_id = %user.id, "Session expiry renewed");
        }

        Ok(Some(ValidatedSession {
            session,
            user,
            renewed,
        }))
    }

    /// Delete exactly one session. Idempotent.
    #[tracing::instrument(skip(self, token))]
    pub async fn invalidate_session(&self, token: &str) -> Result<(), AppError> {
        self.sessions.delete(token).await
    }

    /// "Log out everywhere": delete every session owned by the user.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn invalidate_all_user_sessions(&self, user_id: &str) -> Result<u64, AppError> {
        let deleted = self.sessions.delete_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, deleted, "All user sessions invalidated");
        Ok(deleted)
    }
}
