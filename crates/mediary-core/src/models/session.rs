use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Server-held session: an opaque random token with an absolute, slidable expiry.
///
/// The token is the secret itself (indexed equality lookup, never logged),
/// not a derived hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Expired sessions are treated as absent and deleted at read time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the remaining lifetime is inside the renewal deadband.
    /// Only then does a validation write a new expiry, so an active user
    /// stays logged in without a write on every request.
    pub fn needs_renewal(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        !self.is_expired(now) && self.expires_at - now < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_in(days: i64) -> Session {
        Session {
            token: "aa".repeat(32),
            user_id: "user1".to_string(),
            expires_at: Utc::now() + Duration::days(days),
        }
    }

    #[test]
    fn test_fresh_session_is_not_expired_and_not_renewed() {
        let session = session_expiring_in(30);
        let now = Utc::now();
        assert!(!session.is_expired(now));
        assert!(!session.needs_renewal(now, Duration::days(15)));
    }

    #[test]
    fn test_session_inside_deadband_needs_renewal() {
        let session = session_expiring_in(10);
        let now = Utc::now();
        assert!(!session.is_expired(now));
        assert!(session.needs_renewal(now, Duration::days(15)));
    }

    #[test]
    fn test_expired_session_never_renews() {
        let session = session_expiring_in(-1);
        let now = Utc::now();
        assert!(session.is_expired(now));
        assert!(!session.needs_renewal(now, Duration::days(15)));
    }
}
