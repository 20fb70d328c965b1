//! In-memory capability issuer for tests.
//!
//! Records every signing call and serves existence/listing answers from a
//! settable set of keys, so tests can assert "zero issuer calls" and drive
//! reconciliation scenarios without a real object store.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::traits::{CapabilityIssuer, SignedUpload, StorageError, StorageResult};

#[derive(Default)]
pub struct InMemoryCapabilityIssuer {
    signed_keys: Mutex<Vec<String>>,
    existing: Mutex<HashSet<String>>,
    fail_signing: Mutex<bool>,
}

impl InMemoryCapabilityIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of capabilities issued so far.
    pub fn sign_count(&self) -> usize {
        self.signed_keys.lock().unwrap().len()
    }

    pub fn signed_keys(&self) -> Vec<String> {
        self.signed_keys.lock().unwrap().clone()
    }

    /// Mark an object as present in the store (as if a client had PUT it).
    pub fn put_object(&self, key: &str) {
        self.existing.lock().unwrap().insert(key.to_string());
    }

    /// Make the next signing calls fail, simulating an unreachable issuer.
    pub fn set_fail_signing(&self, fail: bool) {
        *self.fail_signing.lock().unwrap() = fail;
    }
}

#[async_trait]
impl CapabilityIssuer for InMemoryCapabilityIssuer {
    async fn signed_put_url(
        &self,
        key: &str,
        _content_type: &str,
        _content_length: u64,
        expires_in: Duration,
    ) -> StorageResult<SignedUpload> {
        if *self.fail_signing.lock().unwrap() {
            return Err(StorageError::SignFailed("issuer unavailable".to_string()));
        }
        self.signed_keys.lock().unwrap().push(key.to_string());
        Ok(SignedUpload {
            url: format!("https://storage.test/{}?signature=test", key),
            expires_in,
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.existing.lock().unwrap().contains(key))
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .existing
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
