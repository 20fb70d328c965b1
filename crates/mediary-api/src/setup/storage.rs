//! Capability issuer setup

use std::sync::Arc;

use anyhow::Result;
use mediary_core::Config;
use mediary_storage::{CapabilityIssuer, S3CapabilityIssuer};

/// Build the S3-compatible capability issuer from configuration.
/// Credentials are read from the environment by the AWS tooling.
pub fn setup_storage(config: &Config) -> Result<Arc<dyn CapabilityIssuer>> {
    let issuer = S3CapabilityIssuer::new(
        config.storage.bucket.clone(),
        config.storage.region.clone(),
        config.storage.endpoint.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to build storage issuer: {}", e))?;

    tracing::info!(bucket = %config.storage.bucket, "Storage capability issuer ready");

    Ok(Arc::new(issuer))
}
