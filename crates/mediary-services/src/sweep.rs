//! Optional hygiene sweep.
//!
//! Deletes sessions that already expired (the validation path remains the
//! authority — this only reclaims rows nobody will read again) and surfaces
//! intents stuck in `PENDING` so the external reconciliation job has a work
//! list. Correctness never depends on this task running.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mediary_db::{SessionStore, UploadIntentStore};
use tokio::time::interval;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_sessions_deleted: u64,
    pub stale_pending_intents: usize,
}

pub struct SweepService {
    sessions: Arc<dyn SessionStore>,
    intents: Arc<dyn UploadIntentStore>,
    interval_secs: u64,
    /// Age past which a PENDING intent counts as abandoned.
    staleness: chrono::Duration,
}

impl SweepService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        intents: Arc<dyn UploadIntentStore>,
        interval_secs: u64,
        staleness: chrono::Duration,
    ) -> Self {
        Self {
            sessions,
            intents,
            interval_secs,
            staleness,
        }
    }

    /// Start the periodic sweep. Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(Duration::from_secs(self.interval_secs));

            loop {
                sweep_interval.tick().await;

                match self.run_once().await {
                    Ok(report) => {
                        tracing::info!(
                            expired_sessions = report.expired_sessions_deleted,
                            stale_pending = report.stale_pending_intents,
                            "Hygiene sweep completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Hygiene sweep failed");
                    }
                }
            }
        })
    }

    /// One sweep pass. Session deletion and intent reporting are isolated so
    /// a failure in one does not stop the other.
    pub async fn run_once(&self) -> Result<SweepReport, anyhow::Error> {
        let now = Utc::now();

        let expired_sessions_deleted = match self.sessions.delete_expired(now).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete expired sessions");
                0
            }
        };

        let stale = self.intents.list_stale_pending(now - self.staleness).await?;
        for intent in &stale {
            tracing::warn!(
                intent_id = intent.id,
                user_id = %intent.user_id,
                storage_key = %intent.storage_key,
                age_hours = (now - intent.created_at).num_hours(),
                "Upload intent stuck in pending"
            );
        }

        Ok(SweepReport {
            expired_sessions_deleted,
            stale_pending_intents: stale.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediary_core::models::{NewUploadIntent, Session};
    use mediary_db::{InMemorySessionStore, InMemoryUploadIntentStore, InMemoryUserStore};

    #[tokio::test]
    async fn test_sweep_reclaims_expired_sessions_and_reports_stale_intents() {
        let users = Arc::new(InMemoryUserStore::new());
        let sessions = Arc::new(InMemorySessionStore::new(users));
        let intents = Arc::new(InMemoryUploadIntentStore::new());

        sessions
            .insert(&Session {
                token: "aa".repeat(32),
                user_id: "u1".to_string(),
                expires_at: Utc::now() - chrono::Duration::days(1),
            })
            .await
            .unwrap();
        sessions
            .insert(&Session {
                token: "bb".repeat(32),
                user_id: "u1".to_string(),
                expires_at: Utc::now() + chrono::Duration::days(1),
            })
            .await
            .unwrap();

        let stuck = intents
            .insert_pending(NewUploadIntent {
                user_id: "u1".to_string(),
                file_name: "a.jpg".to_string(),
                storage_key: "uploads/u1/1-a.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                size_bytes: 100,
            })
            .await
            .unwrap();
        intents.set_created_at(stuck.id, Utc::now() - chrono::Duration::hours(48));

        let sweep = SweepService::new(
            sessions.clone(),
            intents,
            3600,
            chrono::Duration::hours(24),
        );
        let report = sweep.run_once().await.unwrap();

        assert_eq!(report.expired_sessions_deleted, 1);
        assert_eq!(report.stale_pending_intents, 1);
        assert_eq!(sessions.session_count(), 1);
    }
}
