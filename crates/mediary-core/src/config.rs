//! Configuration module
//!
//! Application configuration is an explicit struct built once at startup and
//! passed by reference into the session, identity, and upload constructors.
//! `from_env()` is a convenience constructor; every field is public so tests
//! and embedders can build a `Config` literally.

use std::env;

use chrono::Duration;

// Common constants
const MAX_DB_CONNECTIONS: u32 = 20;
const DB_CONNECTION_TIMEOUT_SECS: u64 = 30;
const SESSION_DURATION_DAYS: i64 = 30;
const SESSION_RENEWAL_THRESHOLD_DAYS: i64 = 15;
const SESSION_COOKIE_NAME: &str = "session";
const MAX_FILE_SIZE_MB: u64 = 100;
const SIGNED_URL_EXPIRY_SECS: u64 = 600;
const UPLOAD_KEY_PREFIX: &str = "uploads";

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Database pool settings
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// Session lifecycle settings
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub duration_days: i64,
    pub renewal_threshold_days: i64,
    /// Secure attribute on the session cookie. Forced on in production.
    pub cookie_secure: bool,
}

impl SessionConfig {
    /// Fixed lifetime applied at creation and at each renewal.
    pub fn duration(&self) -> Duration {
        Duration::days(self.duration_days)
    }

    /// Remaining-lifetime deadband under which a validated session is renewed.
    pub fn renewal_threshold(&self) -> Duration {
        Duration::days(self.renewal_threshold_days)
    }
}

/// Direct-upload settings
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_file_size_bytes: u64,
    pub signed_url_expiry_secs: u64,
    pub key_prefix: String,
}

/// Object storage (capability issuer) settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers (R2, MinIO, etc.)
    pub endpoint: Option<String>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let config = Config {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "4000".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                environment,
                cors_origins,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| MAX_DB_CONNECTIONS.to_string())
                    .parse()
                    .unwrap_or(MAX_DB_CONNECTIONS),
                connect_timeout_secs: env::var("DB_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| DB_CONNECTION_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(DB_CONNECTION_TIMEOUT_SECS),
            },
            session: SessionConfig {
                cookie_name: env::var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|_| SESSION_COOKIE_NAME.to_string()),
                duration_days: env::var("SESSION_DURATION_DAYS")
                    .unwrap_or_else(|_| SESSION_DURATION_DAYS.to_string())
                    .parse()
                    .unwrap_or(SESSION_DURATION_DAYS),
                renewal_threshold_days: env::var("SESSION_RENEWAL_THRESHOLD_DAYS")
                    .unwrap_or_else(|_| SESSION_RENEWAL_THRESHOLD_DAYS.to_string())
                    .parse()
                    .unwrap_or(SESSION_RENEWAL_THRESHOLD_DAYS),
                cookie_secure: is_production,
            },
            upload: UploadConfig {
                max_file_size_bytes: env::var("MAX_FILE_SIZE_MB")
                    .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
                    .parse::<u64>()
                    .unwrap_or(MAX_FILE_SIZE_MB)
                    * 1024
                    * 1024,
                signed_url_expiry_secs: env::var("SIGNED_URL_EXPIRY_SECS")
                    .unwrap_or_else(|_| SIGNED_URL_EXPIRY_SECS.to_string())
                    .parse()
                    .unwrap_or(SIGNED_URL_EXPIRY_SECS),
                key_prefix: env::var("UPLOAD_KEY_PREFIX")
                    .unwrap_or_else(|_| UPLOAD_KEY_PREFIX.to_string()),
            },
            storage: StorageConfig {
                bucket: env::var("S3_BUCKET")
                    .map_err(|_| anyhow::anyhow!("S3_BUCKET must be set"))?,
                region: env::var("S3_REGION").ok().or_else(|| env::var("AWS_REGION").ok()),
                endpoint: env::var("S3_ENDPOINT").ok(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database.url.starts_with("postgresql://")
            && !self.database.url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.session.duration_days <= 0 {
            return Err(anyhow::anyhow!("SESSION_DURATION_DAYS must be positive"));
        }
        if self.session.renewal_threshold_days < 0
            || self.session.renewal_threshold_days > self.session.duration_days
        {
            return Err(anyhow::anyhow!(
                "SESSION_RENEWAL_THRESHOLD_DAYS must be between 0 and the session duration"
            ));
        }

        if self.is_production() && !self.session.cookie_secure {
            return Err(anyhow::anyhow!(
                "Session cookie must be Secure in production"
            ));
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be non-zero"));
        }
        if self.upload.signed_url_expiry_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_EXPIRY_SECS must be non-zero"));
        }

        if self.storage.bucket.is_empty() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set"));
        }
        if self.storage.region.is_none() && self.storage.endpoint.is_none() {
            return Err(anyhow::anyhow!(
                "S3_REGION or S3_ENDPOINT must be set for the storage backend"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                port: 4000,
                environment: "development".to_string(),
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/mediary".to_string(),
                max_connections: 5,
                connect_timeout_secs: 5,
            },
            session: SessionConfig {
                cookie_name: "session".to_string(),
                duration_days: 30,
                renewal_threshold_days: 15,
                cookie_secure: false,
            },
            upload: UploadConfig {
                max_file_size_bytes: 100 * 1024 * 1024,
                signed_url_expiry_secs: 600,
                key_prefix: "uploads".to_string(),
            },
            storage: StorageConfig {
                bucket: "mediary-test".to_string(),
                region: Some("us-east-1".to_string()),
                endpoint: None,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_renewal_threshold_must_fit_duration() {
        let mut config = test_config();
        config.session.renewal_threshold_days = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_requires_secure_cookie() {
        let mut config = test_config();
        config.server.environment = "production".to_string();
        config.session.cookie_secure = false;
        assert!(config.validate().is_err());

        config.session.cookie_secure = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_requires_region_or_endpoint() {
        let mut config = test_config();
        config.storage.region = None;
        assert!(config.validate().is_err());

        config.storage.endpoint = Some("https://accountid.r2.cloudflarestorage.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_durations() {
        let config = test_config();
        assert_eq!(config.session.duration(), Duration::days(30));
        assert_eq!(config.session.renewal_threshold(), Duration::days(15));
    }
}
