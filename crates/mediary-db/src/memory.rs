//! In-memory store implementations.
//!
//! Used by service and API tests to exercise the full session and upload
//! logic without a running Postgres. Each store mirrors the semantics of its
//! repository counterpart, including conflict reporting and guarded status
//! transitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediary_core::models::{
    ExternalProfile, NewUploadIntent, NewUser, Session, UploadIntent, UploadStatus, User,
};
use mediary_core::AppError;

use crate::db::control::{SessionStore, UserStore};
use crate::db::media::UploadIntentStore;

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.external_id == new_user.external_id || u.email == new_user.email)
        {
            return Err(AppError::Conflict(format!(
                "User already exists for external id {}",
                new_user.external_id
            )));
        }
        let now = Utc::now();
        let user = User {
            id: new_user.id,
            external_id: new_user.external_id,
            email: new_user.email,
            name: new_user.name,
            picture_url: new_user.picture_url,
            tier: new_user.tier,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        profile: &ExternalProfile,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.name = profile.name.clone();
            user.picture_url = profile.picture_url.clone();
            user.last_login_at = Some(Utc::now());
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory session store, joined against a shared user store
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    users: Arc<InMemoryUserStore>,
}

impl InMemorySessionStore {
    pub fn new(users: Arc<InMemoryUserStore>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            users,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Test hook: rewrite a stored expiry to simulate the passage of time.
    pub fn set_expiry(&self, token: &str, expires_at: DateTime<Utc>) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(token) {
            session.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_with_user(&self, token: &str) -> Result<Option<(Session, User)>, AppError> {
        let session = {
            let sessions = self.sessions.lock().unwrap();
            sessions.get(token).cloned()
        };
        let Some(session) = session else {
            return Ok(None);
        };
        let Some(user) = self.users.find_by_id(&session.user_id).await? else {
            return Ok(None);
        };
        Ok(Some((session, user)))
    }

    async fn update_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(token) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(token);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory upload intent store
#[derive(Default)]
pub struct InMemoryUploadIntentStore {
    intents: Mutex<Vec<UploadIntent>>,
    next_id: AtomicI64,
}

impl InMemoryUploadIntentStore {
    pub fn new() -> Self {
        Self {
            intents: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn intent_count(&self) -> usize {
        self.intents.lock().unwrap().len()
    }

    /// Test hook: backdate an intent to simulate staleness.
    pub fn set_created_at(&self, id: i64, created_at: DateTime<Utc>) {
        let mut intents = self.intents.lock().unwrap();
        if let Some(intent) = intents.iter_mut().find(|i| i.id == id) {
            intent.created_at = created_at;
        }
    }
}

#[async_trait]
impl UploadIntentStore for InMemoryUploadIntentStore {
    async fn insert_pending(&self, new_intent: NewUploadIntent) -> Result<UploadIntent, AppError> {
        let mut intents = self.intents.lock().unwrap();
        if intents.iter().any(|i| i.storage_key == new_intent.storage_key) {
            return Err(AppError::Conflict(format!(
                "Storage key already exists: {}",
                new_intent.storage_key
            )));
        }
        let now = Utc::now();
        let intent = UploadIntent {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: new_intent.user_id,
            file_name: new_intent.file_name,
            storage_key: new_intent.storage_key,
            content_type: new_intent.content_type,
            size_bytes: new_intent.size_bytes,
            status: UploadStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        intents.push(intent.clone());
        Ok(intent)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UploadIntent>, AppError> {
        let intents = self.intents.lock().unwrap();
        Ok(intents.iter().find(|i| i.id == id).cloned())
    }

    async fn transition(
        &self,
        id: i64,
        from: UploadStatus,
        to: UploadStatus,
        error_message: Option<String>,
    ) -> Result<bool, AppError> {
        let mut intents = self.intents.lock().unwrap();
        match intents.iter_mut().find(|i| i.id == id && i.status == from) {
            Some(intent) => {
                intent.status = to;
                intent.error_message = error_message;
                intent.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadIntent>, AppError> {
        let intents = self.intents.lock().unwrap();
        let mut mine: Vec<UploadIntent> = intents
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_stale_pending(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<UploadIntent>, AppError> {
        let intents = self.intents.lock().unwrap();
        let mut stale: Vec<UploadIntent> = intents
            .iter()
            .filter(|i| i.status == UploadStatus::Pending && i.created_at < older_than)
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(stale)
    }
}
