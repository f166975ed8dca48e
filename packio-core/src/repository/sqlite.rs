use crate::error::Result;
use crate::repository::{ContentRecord, ContentRepository};
use crate::storage::StorageLocation;
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;

/// SQLite-backed content repository.
pub struct SqliteRepository {
    db_path: PathBuf,
}

impl SqliteRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let repository = Self {
            db_path: db_path.into(),
        };
        repository.init_schema()?;
        Ok(repository)
    }

    fn get_conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS contents (
                content_id TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                length INTEGER NOT NULL,
                sha256 TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

#[async_trait]
impl ContentRepository for SqliteRepository {
    async fn save(&self, record: &ContentRecord) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT OR REPLACE INTO contents (
                content_id, location, length, sha256, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.content_id,
                record.location.as_str(),
                record.length as i64,
                record.sha256,
                record.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    async fn get(&self, content_id: &str) -> Result<Option<ContentRecord>> {
        let conn = self.get_conn()?;

        let row: Option<(String, i64, String, String)> = conn
            .query_row(
                "SELECT location, length, sha256, created_at
                 FROM contents WHERE content_id = ?1",
                [content_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((location, length, sha256, created_at)) => Ok(Some(ContentRecord {
                content_id: content_id.to_string(),
                location: StorageLocation::new(location),
                length: length as u64,
                sha256,
                created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
                    .with_timezone(&chrono::Utc),
            })),
            None => Ok(None),
        }
    }
}
