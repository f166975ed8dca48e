use crate::config::StorageMode;
use crate::error::{PackError, Result};
use crate::storage::s3::{S3Store, parse_s3_location};
use crate::storage::{PublicationStore, StorageLocation};
use bytes::Bytes;
use std::path::PathBuf;

/// Request to move a locally written encrypted publication into its
/// definitive object-store location.
#[derive(Debug, Clone)]
pub struct FinalizePublicationRequest {
    pub content_id: String,
    pub storage_mode: StorageMode,
    pub input_path: PathBuf,
    /// Compact location descriptor, `"s3:<region>:<bucket>"`.
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct FinalizePublicationResult {
    pub location: StorageLocation,
}

/// Upload a locally written publication under its content id.
///
/// Only publications declared for s3 storage are processed. The local input
/// file is removed on every exit path, including mode mismatch and backend
/// construction failure; a failed removal is logged and otherwise ignored.
pub async fn finalize_publication(
    request: FinalizePublicationRequest,
) -> Result<FinalizePublicationResult> {
    let _cleanup = TempFileGuard::new(request.input_path.clone());

    if request.storage_mode != StorageMode::S3 {
        return Err(PackError::ModeMismatch(format!(
            "only s3 publications can be finalized, got mode {}",
            request.storage_mode.as_str()
        )));
    }

    let config = parse_s3_location(&request.location)?;
    let store = S3Store::from_config(&config)?;

    upload_input(&store, &request).await
}

async fn upload_input(
    store: &S3Store,
    request: &FinalizePublicationRequest,
) -> Result<FinalizePublicationResult> {
    let payload = tokio::fs::read(&request.input_path).await?;
    let location = store.add(&request.content_id, Bytes::from(payload)).await?;
    Ok(FinalizePublicationResult { location })
}

/// Removes a temporary input file when dropped. Removal is best-effort; a
/// failure is logged and never surfaced to the caller.
struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_file(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove temp input {}: {}",
                    self.path.display(),
                    error
                );
            }
        }
    }
}
