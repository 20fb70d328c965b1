//! Login orchestration: what happens after the identity provider's callback
//! has verified a profile — resolve the local user, then open a session.

use mediary_core::models::{ExternalProfile, Session, User};
use mediary_core::AppError;

use crate::identity::IdentityService;
use crate::session::SessionService;

#[derive(Clone)]
pub struct LoginService {
    identity: IdentityService,
    sessions: SessionService,
}

impl LoginService {
    pub fn new(identity: IdentityService, sessions: SessionService) -> Self {
        Self { identity, sessions }
    }

    /// Complete a login from a verified external profile: find or create the
    /// user, refresh its mutable fields, and issue a session. The caller
    /// turns the returned session into a cookie.
    #[tracing::instrument(skip(self, profile), fields(external_id = %profile.external_id))]
    pub async fn login_from_external(
        &self,
        profile: &ExternalProfile,
    ) -> Result<(User, Session), AppError> {
        let user = self.identity.resolve(profile).await?;
        let session = self.sessions.create_session(&user.id).await?;

        tracing::info!(user_id = %user.id, "Login completed");

        Ok((user, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediary_core::SessionConfig;
    use mediary_db::{InMemorySessionStore, InMemoryUserStore};
    use std::sync::Arc;

    fn setup() -> (LoginService, SessionService) {
        let users = Arc::new(InMemoryUserStore::new());
        let sessions = Arc::new(InMemorySessionStore::new(users.clone()));
        let session_service = SessionService::new(
            sessions,
            SessionConfig {
                cookie_name: "session".to_string(),
                duration_days: 30,
                renewal_threshold_days: 15,
                cookie_secure: false,
            },
        );
        let login = LoginService::new(IdentityService::new(users), session_service.clone());
        (login, session_service)
    }

    #[tokio::test]
    async fn test_login_creates_user_and_valid_session() {
        let (login, sessions) = setup();
        let profile = ExternalProfile {
            external_id: "ext-1".to_string(),
            email: "jo@example.com".to_string(),
            name: None,
            picture_url: None,
            email_verified: true,
        };

        let (user, session) = login.login_from_external(&profile).await.unwrap();
        assert_eq!(session.user_id, user.id);

        let validated = sessions
            .validate_session(&session.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(validated.user.id, user.id);
    }

    #[tokio::test]
    async fn test_two_logins_share_a_user_but_not_a_session() {
        let (login, _sessions) = setup();
        let profile = ExternalProfile {
            external_id: "ext-1".to_string(),
            email: "jo@example.com".to_string(),
            name: None,
            picture_url: None,
            email_verified: true,
        };

        let (user_a, session_a) = login.login_from_external(&profile).await.unwrap();
        let (user_b, session_b) = login.login_from_external(&profile).await.unwrap();

        assert_eq!(user_a.id, user_b.id);
        assert_ne!(session_a.token, session_b.token);
        assert!(user_b.last_login_at.is_some());
    }
}
