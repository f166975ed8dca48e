use crate::config::S3Config;
use crate::error::{PackError, Result};
use crate::storage::{PublicationStore, StorageLocation};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use std::sync::Arc;

/// Publication store backed by an S3-compatible object store.
///
/// Keys are the bare content ids; locations are `s3://<bucket>/<id>`.
pub struct S3Store {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl S3Store {
    /// Build the store from configuration.
    ///
    /// Credentials left empty fall back to the usual AWS environment
    /// variables. Fails with a configuration error when bucket or region is
    /// missing.
    pub fn from_config(config: &S3Config) -> Result<Self> {
        if config.bucket.trim().is_empty() {
            return Err(PackError::Config("s3 bucket cannot be empty".to_string()));
        }
        if config.region.trim().is_empty() {
            return Err(PackError::Config("s3 region cannot be empty".to_string()));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        if !config.access_id.is_empty() {
            builder = builder.with_access_key_id(&config.access_id);
        }
        if !config.secret.is_empty() {
            builder = builder.with_secret_access_key(&config.secret);
        }
        if let Some(token) = config.token.as_deref().filter(|value| !value.is_empty()) {
            builder = builder.with_token(token);
        }
        if let Some(endpoint) = config.endpoint.as_deref().filter(|value| !value.is_empty()) {
            builder = builder.with_endpoint(endpoint);
        }
        if config.disable_ssl {
            builder = builder.with_allow_http(true);
        }
        if config.path_style {
            builder = builder.with_virtual_hosted_style_request(false);
        }

        let store = builder
            .build()
            .map_err(|error| PackError::Config(error.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    pub(crate) fn from_parts(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(&self, content_id: &str) -> StorageLocation {
        StorageLocation::new(format!("s3://{}/{}", self.bucket, content_id))
    }
}

#[async_trait]
impl PublicationStore for S3Store {
    async fn add(&self, content_id: &str, payload: Bytes) -> Result<StorageLocation> {
        let key = ObjectPath::from(content_id);
        self.store.put(&key, payload.into()).await?;

        tracing::debug!("Uploaded publication {} to bucket {}", content_id, self.bucket);
        Ok(self.location(content_id))
    }

    async fn get(&self, content_id: &str) -> Result<Bytes> {
        let key = ObjectPath::from(content_id);
        let result = self.store.get(&key).await?;
        let data = result.bytes().await?;
        Ok(data)
    }

    async fn delete(&self, content_id: &str) -> Result<()> {
        let key = ObjectPath::from(content_id);
        self.store.delete(&key).await?;
        Ok(())
    }
}

/// Parse a compact `"s3:<region>:<bucket>"` location descriptor.
pub fn parse_s3_location(descriptor: &str) -> Result<S3Config> {
    let parts: Vec<&str> = descriptor.split(':').collect();
    if parts.len() < 3 {
        return Err(PackError::Config(format!(
            "malformed s3 location descriptor: {}",
            descriptor
        )));
    }
    if parts[0] != "s3" {
        return Err(PackError::Config(format!(
            "unsupported location scheme: {}",
            parts[0]
        )));
    }

    Ok(S3Config {
        region: parts[1].to_string(),
        bucket: parts[2].to_string(),
        ..S3Config::default()
    })
}
