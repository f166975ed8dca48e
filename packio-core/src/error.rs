use thiserror::Error;

pub type Result<T> = std::result::Result<T, PackError>;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("content not found: {0}")]
    NotFound(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("storage mode mismatch: {0}")]
    ModeMismatch(String),

    #[error("submission queue is closed")]
    QueueClosed,

    #[error("submission queue is full")]
    QueueFull,

    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for PackError {
    fn from(error: rusqlite::Error) -> Self {
        PackError::Repository(error.to_string())
    }
}

impl From<object_store::Error> for PackError {
    fn from(error: object_store::Error) -> Self {
        match error {
            object_store::Error::NotFound { path, .. } => PackError::NotFound(path),
            other => PackError::Transport(other.to_string()),
        }
    }
}
