use crate::error::{PackError, Result};
use crate::storage::{PublicationStore, StorageLocation};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Publication store backed by a local directory.
///
/// Payloads are written to `root/<content_id>` and addressed as
/// `<public_base_url>/<content_id>`. The root directory must already exist;
/// creating it belongs to the caller that owns the deployment layout.
pub struct FileSystemStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn payload_path(&self, content_id: &str) -> PathBuf {
        self.root.join(content_id)
    }

    fn location(&self, content_id: &str) -> StorageLocation {
        StorageLocation::new(format!("{}/{}", self.public_base_url, content_id))
    }
}

#[async_trait]
impl PublicationStore for FileSystemStore {
    async fn add(&self, content_id: &str, payload: Bytes) -> Result<StorageLocation> {
        let path = self.payload_path(content_id);

        // Write to temporary file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&payload).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Stored publication {} ({} bytes)", content_id, payload.len());
        Ok(self.location(content_id))
    }

    async fn get(&self, content_id: &str) -> Result<Bytes> {
        let path = self.payload_path(content_id);

        if !path.exists() {
            return Err(PackError::NotFound(content_id.to_string()));
        }

        let data = fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, content_id: &str) -> Result<()> {
        let path = self.payload_path(content_id);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
}
