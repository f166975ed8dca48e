//! Packio Core - packaging and storage pipeline for licensed publications
//!
//! Accepts already-encrypted publication payloads, persists them into a
//! pluggable blob store, and records content metadata for later license
//! requests:
//! - bounded worker pool over one shared job queue
//! - filesystem and S3 storage backends behind one trait
//! - SQLite for content metadata
//! - graceful draining with a bounded shutdown budget

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod operations;
pub mod packager;
pub mod repository;
pub mod storage;

pub use config::{FileSystemConfig, S3Config, StorageConfig, StorageMode};
pub use error::{PackError, Result};
pub use lifecycle::{DEFAULT_DRAIN_TIMEOUT, DrainOutcome, LifecycleManager, LifecycleState};
pub use operations::{
    FinalizePublicationRequest, FinalizePublicationResult, finalize_publication,
};
pub use packager::{DEFAULT_QUEUE_CAPACITY, JobSource, Packager, PackagingJob, PackagingTicket};
pub use repository::{ContentRecord, ContentRepository, SqliteRepository};
pub use storage::{
    FileSystemStore, PublicationStore, S3Store, StorageLocation, StoreBuilder, compute_hash,
    parse_s3_location, verify_hash,
};
