//! Storage backends for encrypted publication payloads.
//!
//! Provides the pluggable store trait, the filesystem and S3 variants, and
//! the factory that builds one from configuration.

pub mod factory;
pub mod filesystem;
pub mod s3;

use crate::error::{PackError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use factory::StoreBuilder;
pub use filesystem::FileSystemStore;
pub use s3::{S3Store, parse_s3_location};

/// Backend-specific reference to a stored payload.
///
/// Opaque to callers; only the backend that produced it knows how to
/// interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageLocation(String);

impl StorageLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-addressed blob store for encrypted publications.
///
/// Implementations are stateless capability values safe for concurrent use
/// by every packaging worker.
#[async_trait]
pub trait PublicationStore: Send + Sync {
    /// Store a payload under the given content id and return its location.
    ///
    /// Re-adding an existing id is last-writer-wins; a partially written
    /// payload is never visible.
    async fn add(&self, content_id: &str, payload: Bytes) -> Result<StorageLocation>;

    /// Retrieve the payload stored under the given content id.
    async fn get(&self, content_id: &str) -> Result<Bytes>;

    /// Remove the payload stored under the given content id.
    async fn delete(&self, content_id: &str) -> Result<()>;
}

/// Compute SHA256 hash of data
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify that data matches the expected hash
pub fn verify_hash(data: &[u8], expected_hash: &str) -> Result<()> {
    let actual_hash = compute_hash(data);
    if actual_hash != expected_hash {
        return Err(PackError::HashMismatch {
            expected: expected_hash.to_string(),
            actual: actual_hash,
        });
    }
    Ok(())
}
