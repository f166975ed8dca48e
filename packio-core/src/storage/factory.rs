use crate::config::{S3Config, StorageConfig, StorageMode};
use crate::error::{PackError, Result};
use crate::storage::{FileSystemStore, PublicationStore, S3Store};
use std::path::PathBuf;
use std::sync::Arc;

/// Builds a publication store from storage configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    mode: Option<StorageMode>,
    directory: Option<PathBuf>,
    public_base_url: Option<String>,
    s3: Option<S3Config>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let mut builder = Self::new().mode(config.mode);
        if let Some(filesystem) = &config.filesystem {
            builder = builder
                .directory(filesystem.directory.clone())
                .public_base_url(filesystem.public_base_url.clone());
        }
        if let Some(s3) = &config.s3 {
            builder = builder.s3(s3.clone());
        }
        builder
    }

    pub fn mode(mut self, mode: StorageMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    pub fn s3(mut self, config: S3Config) -> Self {
        self.s3 = Some(config);
        self
    }

    pub fn build(&self) -> Result<Arc<dyn PublicationStore>> {
        let mode = self
            .mode
            .ok_or_else(|| PackError::Config("storage mode is required".to_string()))?;

        match mode {
            StorageMode::Filesystem => {
                let directory = self.directory.clone().ok_or_else(|| {
                    PackError::Config(
                        "storage directory is required for filesystem mode".to_string(),
                    )
                })?;
                if directory.as_os_str().is_empty() {
                    return Err(PackError::Config(
                        "storage directory cannot be empty".to_string(),
                    ));
                }

                let public_base_url = self
                    .public_base_url
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                if public_base_url.is_empty() {
                    return Err(PackError::Config(
                        "public base url is required for filesystem mode".to_string(),
                    ));
                }

                Ok(Arc::new(FileSystemStore::new(directory, public_base_url)))
            }
            StorageMode::S3 => {
                let config = self.s3.as_ref().ok_or_else(|| {
                    PackError::Config("s3 configuration is required for s3 mode".to_string())
                })?;

                let store = S3Store::from_config(config)?;
                Ok(Arc::new(store))
            }
        }
    }
}
