use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend selection and per-backend settings.
///
/// Supplied by the bootstrap layer; the core never reads it from a global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub mode: StorageMode,
    #[serde(default)]
    pub filesystem: Option<FileSystemConfig>,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Filesystem,
    S3,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Filesystem => "filesystem",
            StorageMode::S3 => "s3",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSystemConfig {
    pub directory: PathBuf,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub disable_ssl: bool,
    #[serde(default)]
    pub path_style: bool,
}
