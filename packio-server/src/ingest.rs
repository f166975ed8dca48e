use crate::config::IngestConfig;
use bytes::Bytes;
use packio_core::{JobSource, PackError};
use std::path::Path;
use std::time::Duration;

/// Periodically sweep the ingest directory, submitting each regular file as
/// a packaging job.
///
/// Inputs are removed once stored; a failed input stays in place for the
/// next scan. The loop exits when the queue closes.
pub async fn ingest_loop(source: JobSource, config: IngestConfig) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(config.scan_interval_secs.max(1)));

    loop {
        interval.tick().await;

        match scan_directory(&source, &config.directory).await {
            Ok(0) => {}
            Ok(imported) => tracing::info!("Ingested {} publications", imported),
            Err(PackError::QueueClosed) => {
                tracing::info!("Ingest loop stopping, queue closed");
                break;
            }
            Err(error) => tracing::warn!("Ingest scan failed: {}", error),
        }
    }
}

async fn scan_directory(source: &JobSource, directory: &Path) -> packio_core::Result<usize> {
    let mut imported = 0usize;
    let mut entries = tokio::fs::read_dir(directory).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let path = entry.path();
        let Some(content_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if content_id.is_empty() || content_id.starts_with('.') {
            continue;
        }

        let payload = tokio::fs::read(&path).await?;
        let ticket = source.submit(content_id, Bytes::from(payload)).await?;

        match ticket.wait().await {
            Ok(location) => {
                tracing::info!("Ingested {} at {}", content_id, location);
                if let Err(error) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        "Failed to remove ingested input {}: {}",
                        path.display(),
                        error
                    );
                }
                imported += 1;
            }
            Err(error) => {
                tracing::warn!(
                    "Packaging of {} failed, keeping input for retry: {}",
                    content_id,
                    error
                );
            }
        }
    }

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packio_core::{ContentRepository, FileSystemStore, Packager, SqliteRepository};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_scan_stores_and_removes_inputs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let inbox = temp_dir.path().join("inbox");
        let files = temp_dir.path().join("files");
        std::fs::create_dir_all(&inbox).unwrap();
        std::fs::create_dir_all(&files).unwrap();

        std::fs::write(inbox.join("pub-1.epub"), b"first payload").unwrap();
        std::fs::write(inbox.join("pub-2.epub"), b"second payload").unwrap();

        let store = Arc::new(FileSystemStore::new(&files, "https://license.example.com/files"));
        let repository =
            Arc::new(SqliteRepository::new(temp_dir.path().join("contents.sqlite")).unwrap());
        let packager = Packager::new(store, repository.clone(), 2);
        let source = packager.source();

        let imported = scan_directory(&source, &inbox).await.unwrap();
        assert_eq!(imported, 2);

        assert!(!inbox.join("pub-1.epub").exists());
        assert!(!inbox.join("pub-2.epub").exists());

        let record = repository.get("pub-1").await.unwrap().unwrap();
        assert_eq!(record.length, b"first payload".len() as u64);

        packager.shutdown().await;
    }

    #[tokio::test]
    async fn test_scan_propagates_queue_closed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let inbox = temp_dir.path().join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        std::fs::write(inbox.join("pub-1.epub"), b"payload").unwrap();

        let store = Arc::new(FileSystemStore::new(
            temp_dir.path(),
            "https://license.example.com/files",
        ));
        let packager = Packager::new(
            store,
            Arc::new(SqliteRepository::new(temp_dir.path().join("contents.sqlite")).unwrap()),
            1,
        );
        let source = packager.source();
        source.stop();

        let result = scan_directory(&source, &inbox).await;
        assert!(matches!(result, Err(PackError::QueueClosed)));
        assert!(inbox.join("pub-1.epub").exists());

        packager.shutdown().await;
    }
}
