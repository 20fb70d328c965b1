//! Object-storage capability issuer.
//!
//! The object store is the data plane: clients transfer bytes directly using
//! time-limited presigned URLs, and this crate is the boundary that issues
//! those capabilities and answers the read-only questions (existence,
//! listings) the reconciliation sweep asks.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod s3;
pub mod traits;

pub use keys::derive_upload_key;
#[cfg(feature = "memory")]
pub use memory::InMemoryCapabilityIssuer;
pub use s3::S3CapabilityIssuer;
pub use traits::{CapabilityIssuer, SignedUpload, StorageError, StorageResult};
