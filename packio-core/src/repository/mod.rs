//! Content metadata records and their persistence.

pub mod sqlite;

use crate::Result;
use crate::storage::StorageLocation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use sqlite::SqliteRepository;

/// Metadata recorded for a stored publication.
///
/// Created once by a packaging worker after a successful store and never
/// mutated afterwards; removal belongs to an external retention process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub content_id: String,
    pub location: StorageLocation,
    pub length: u64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence for content records, keyed by content id.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn save(&self, record: &ContentRecord) -> Result<()>;

    async fn get(&self, content_id: &str) -> Result<Option<ContentRecord>>;
}
