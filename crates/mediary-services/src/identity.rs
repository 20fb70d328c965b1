//! Identity resolution: bridge an externally verified identity to a local
//! user record. Used only at login time; the provider handshake itself is an
//! external collaborator and the profile it hands over is trusted as-is.

use std::sync::Arc;

use mediary_core::models::{ExternalProfile, NewUser, User};
use mediary_core::{generate_user_id, AppError};
use mediary_db::UserStore;

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Pure lookup by the provider's subject id.
    pub async fn find_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        self.users.find_by_external_id(external_id).await
    }

    /// Create a user from a first login.
    ///
    /// Two simultaneous first logins from the same brand-new identity race on
    /// the unique external-id constraint; the loser recovers by re-reading,
    /// so both callers get the same permanent row.
    #[tracing::instrument(skip(self, profile), fields(external_id = %profile.external_id))]
    pub async fn create_user_from_external(
        &self,
        profile: &ExternalProfile,
    ) -> Result<User, AppError> {
        let new_user = NewUser::from_profile(generate_user_id(), profile);
        match self.users.insert(new_user).await {
            Ok(user) => Ok(user),
            Err(AppError::Conflict(_)) => {
                tracing::debug!("Concurrent first login, re-reading existing user");
                self.users
                    .find_by_external_id(&profile.external_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(
                            "User insert conflicted but no row found on re-read".to_string(),
                        )
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh mutable profile fields and the last-login stamp.
    /// Immutable fields (internal id, external id) are never touched.
    #[tracing::instrument(skip(self, profile), fields(user_id = %user_id))]
    pub async fn update_user_from_external(
        &self,
        user_id: &str,
        profile: &ExternalProfile,
    ) -> Result<(), AppError> {
        self.users.update_profile(user_id, profile).await
    }

    /// Find-or-create plus per-login refresh, as one operation.
    pub async fn resolve(&self, profile: &ExternalProfile) -> Result<User, AppError> {
        match self.find_user_by_external_id(&profile.external_id).await? {
            Some(user) => {
                self.update_user_from_external(&user.id, profile).await?;
                self.users.find_by_id(&user.id).await?.ok_or_else(|| {
                    AppError::Internal("User disappeared during login".to_string())
                })
            }
            None => self.create_user_from_external(profile).await,
        }
    }
}
