//! Capability issuer abstraction
//!
//! This module defines the trait every object-storage backend must implement.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A time-limited write capability for one specific object.
#[derive(Debug, Clone)]
pub struct SignedUpload {
    /// Presigned PUT URL
    pub url: String,
    /// Lifetime the signer granted
    pub expires_in: Duration,
}

/// Capability issuer abstraction
///
/// Implementations issue bounded-lifetime write URLs scoped to exactly one
/// (key, content type, content length) triple. Enforcement of the declared
/// type and length at transfer time is the store's contract; callers do not
/// re-verify it.
#[async_trait]
pub trait CapabilityIssuer: Send + Sync {
    /// Issue a presigned PUT URL for `key`, valid for `expires_in`.
    async fn signed_put_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
        expires_in: Duration,
    ) -> StorageResult<SignedUpload>;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List object keys under a prefix. Consumed by the reconciliation sweep
    /// to cross-check pending intents against what actually landed.
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
