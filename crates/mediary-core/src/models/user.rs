use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Account tier, assigned at creation and mutated only by billing (out of scope here)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "account_tier", rename_all = "UPPERCASE"))]
pub enum AccountTier {
    Free,
    Premium,
    Admin,
}

/// User entity anchored to an external identity provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub tier: AccountTier,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verified profile handed over by the external identity provider.
/// The provider handshake already verified it; it is trusted as-is.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ExternalProfile {
    #[validate(length(min = 1, max = 255, message = "External id must be 1-255 characters"))]
    pub external_id: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

/// Fields for inserting a new user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub tier: AccountTier,
}

impl NewUser {
    /// A first-login user from a verified external profile, on the default tier.
    pub fn from_profile(id: String, profile: &ExternalProfile) -> Self {
        Self {
            id,
            external_id: profile.external_id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            picture_url: profile.picture_url.clone(),
            tier: AccountTier::Free,
        }
    }
}
