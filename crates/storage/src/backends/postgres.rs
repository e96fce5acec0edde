//! PostgreSQL storage backend.

use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use chrono::{DateTime, Utc};
use confparts_types::{ContentIdentifier, DistributedFile, DistributedFileInfo};
use tokio_postgres::{NoTls, Row};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::traits::DistributedFilesStore;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS distributed_files (
        id BIGSERIAL PRIMARY KEY,
        file_name TEXT NOT NULL UNIQUE,
        content_identifier TEXT NOT NULL UNIQUE,
        file_data BYTEA NOT NULL,
        file_updated_at TIMESTAMPTZ NOT NULL
    )";

const INFO_COLUMNS: &str =
    "file_name, content_identifier, file_updated_at, octet_length(file_data)::BIGINT AS size";

/// Store backed by a `distributed_files` table.
///
/// A replace runs its delete and insert inside one transaction, so readers
/// see either the previous row or the new one.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresStorage {
    /// Connect to the database described by a libpq-style connection string.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let manager = PostgresConnectionManager::new_from_stringlike(connection_string, NoTls)
            .map_err(|e| StorageError::backend(format!("Invalid connection string: {e}")))?;
        let pool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| StorageError::backend(format!("Failed to connect: {e}")))?;

        Ok(Self::from_pool(pool))
    }

    /// Use an existing connection pool.
    pub fn from_pool(pool: Pool<PostgresConnectionManager<NoTls>>) -> Self {
        Self { pool }
    }

    /// Create the table if it does not exist yet.
    pub async fn initialize(&self) -> Result<()> {
        let conn = self.connection().await?;
        conn.batch_execute(CREATE_TABLE)
            .await
            .map_err(|e| StorageError::operation("create table", e))?;
        Ok(())
    }

    async fn connection(
        &self,
    ) -> Result<bb8::PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::backend(format!("Failed to acquire connection: {e}")))
    }
}

fn info_from_row(row: &Row) -> DistributedFileInfo {
    let content_identifier: String = row.get("content_identifier");
    let size: i64 = row.get("size");
    DistributedFileInfo {
        file_name: row.get("file_name"),
        content_identifier: ContentIdentifier::new(content_identifier),
        updated_at: row.get::<_, DateTime<Utc>>("file_updated_at"),
        size: size.max(0) as u64,
    }
}

#[async_trait]
impl DistributedFilesStore for PostgresStorage {
    async fn replace(&self, file: DistributedFile) -> Result<Vec<DistributedFileInfo>> {
        super::ensure_file_name(&file)?;

        let mut conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| StorageError::operation("begin transaction", e))?;

        let displaced = tx
            .query(
                &format!(
                    "DELETE FROM distributed_files \
                     WHERE file_name = $1 OR content_identifier = $2 \
                     RETURNING {INFO_COLUMNS}"
                ),
                &[&file.file_name, &file.content_identifier.as_str()],
            )
            .await
            .map_err(|e| StorageError::operation("delete previous version", e))?;

        tx.execute(
            "INSERT INTO distributed_files \
             (file_name, content_identifier, file_data, file_updated_at) \
             VALUES ($1, $2, $3, $4)",
            &[
                &file.file_name,
                &file.content_identifier.as_str(),
                &file.file_data,
                &file.updated_at,
            ],
        )
        .await
        .map_err(|e| StorageError::operation("insert new version", e))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::operation("commit replace", e))?;

        debug!(
            "Replaced {} in database, displaced {} row(s)",
            file.file_name,
            displaced.len()
        );

        Ok(displaced.iter().map(info_from_row).collect())
    }

    async fn get(&self, file_name: &str) -> Result<Option<DistributedFile>> {
        let conn = self.connection().await?;
        let row = conn
            .query_opt(
                "SELECT file_name, content_identifier, file_data, file_updated_at \
                 FROM distributed_files WHERE file_name = $1",
                &[&file_name],
            )
            .await
            .map_err(|e| StorageError::operation("select file", e))?;

        Ok(row.map(|row| {
            let content_identifier: String = row.get("content_identifier");
            DistributedFile {
                file_name: row.get("file_name"),
                content_identifier: ContentIdentifier::new(content_identifier),
                file_data: row.get("file_data"),
                updated_at: row.get("file_updated_at"),
            }
        }))
    }

    async fn info(&self, file_name: &str) -> Result<Option<DistributedFileInfo>> {
        let conn = self.connection().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {INFO_COLUMNS} FROM distributed_files WHERE file_name = $1"),
                &[&file_name],
            )
            .await
            .map_err(|e| StorageError::operation("select file info", e))?;

        Ok(row.as_ref().map(info_from_row))
    }

    async fn find_by_content_identifier(
        &self,
        content_identifier: &ContentIdentifier,
    ) -> Result<Vec<DistributedFileInfo>> {
        let conn = self.connection().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {INFO_COLUMNS} FROM distributed_files \
                     WHERE content_identifier = $1 ORDER BY file_name"
                ),
                &[&content_identifier.as_str()],
            )
            .await
            .map_err(|e| StorageError::operation("select by content identifier", e))?;

        Ok(rows.iter().map(info_from_row).collect())
    }

    async fn list(&self) -> Result<Vec<DistributedFileInfo>> {
        let conn = self.connection().await?;
        let rows = conn
            .query(
                &format!("SELECT {INFO_COLUMNS} FROM distributed_files ORDER BY file_name"),
                &[],
            )
            .await
            .map_err(|e| StorageError::operation("list files", e))?;

        Ok(rows.iter().map(info_from_row).collect())
    }

    async fn remove(&self, file_name: &str) -> Result<bool> {
        let conn = self.connection().await?;
        let removed = conn
            .execute(
                "DELETE FROM distributed_files WHERE file_name = $1",
                &[&file_name],
            )
            .await
            .map_err(|e| StorageError::operation("delete file", e))?;

        Ok(removed > 0)
    }
}
