//! Filesystem-based storage backend implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use confparts_types::{ContentIdentifier, DistributedFile, DistributedFileInfo};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};
use crate::traits::DistributedFilesStore;

/// Filesystem-based storage backend.
///
/// File contents are stored as opaque blobs and an index maps file names to
/// blobs. A replace writes the new blob first and then swaps the index with an
/// atomic rename, so a reader always sees a complete index.
///
/// Every operation also holds an advisory lock on `.lock` in the root
/// directory, shared for reads and exclusive for writes, so handles in other
/// processes never interleave their index updates.
///
/// Directory structure:
/// ```text
/// storage_root/
/// +-- index.json
/// +-- blobs/
///     +-- {uuid}.bin
/// ```
#[derive(Debug)]
pub struct FilesystemStorage {
    root_path: PathBuf,
    lock: RwLock<()>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct StorageIndex {
    files: Vec<IndexedFile>,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedFile {
    file_name: String,
    content_identifier: ContentIdentifier,
    updated_at: DateTime<Utc>,
    size: u64,
    blob: String,
}

const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock on the storage root, released on drop.
struct DirectoryLock {
    file: std::fs::File,
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl IndexedFile {
    fn info(&self) -> DistributedFileInfo {
        DistributedFileInfo {
            file_name: self.file_name.clone(),
            content_identifier: self.content_identifier.clone(),
            updated_at: self.updated_at,
            size: self.size,
        }
    }
}

impl FilesystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// # Arguments
    /// * `root_path` - Path to the root storage directory
    pub fn new<P: AsRef<Path>>(root_path: P) -> Self {
        Self {
            root_path: root_path.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    /// Initialize the storage directory structure.
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(self.blobs_dir())
            .await
            .map_err(|e| StorageError::backend(format!("Failed to create blobs directory: {e}")))?;

        let _guard = self.lock.write().await;
        let _dir_lock = self.lock_directory(LockMode::Exclusive).await?;
        if !fs::try_exists(self.index_path()).await.unwrap_or(false) {
            self.save_index(&StorageIndex::default()).await?;
        }

        Ok(())
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn index_path(&self) -> PathBuf {
        self.root_path.join("index.json")
    }

    fn blobs_dir(&self) -> PathBuf {
        self.root_path.join("blobs")
    }

    fn blob_path(&self, blob: &str) -> PathBuf {
        self.blobs_dir().join(blob)
    }

    /// Take the advisory lock on the storage root, waiting for other holders.
    async fn lock_directory(&self, mode: LockMode) -> Result<DirectoryLock> {
        let lock_path = self.root_path.join(LOCK_FILE);
        let root_path = self.root_path.clone();

        let locked = tokio::task::spawn_blocking(move || -> std::io::Result<DirectoryLock> {
            std::fs::create_dir_all(&root_path)?;
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(root_path.join(LOCK_FILE))?;

            match mode {
                LockMode::Shared => FileExt::lock_shared(&file)?,
                LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
            }
            Ok(DirectoryLock { file })
        })
        .await
        .map_err(|e| StorageError::backend(format!("Lock task failed: {e}")))?;

        locked.map_err(|e| {
            StorageError::backend(format!("Failed to lock {}: {e}", lock_path.display()))
        })
    }

    async fn load_index(&self) -> Result<StorageIndex> {
        let index_path = self.index_path();
        let content = match fs::read_to_string(&index_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StorageIndex::default());
            }
            Err(e) => {
                return Err(StorageError::backend(format!(
                    "Failed to read index file: {e}"
                )));
            }
        };

        serde_json::from_str(&content).map_err(|e| StorageError::DataConversionError {
            message: "Failed to deserialize index".to_string(),
            source: Some(eyre::eyre!("JSON error: {}", e)),
        })
    }

    /// Write the index next to its final location and rename it into place.
    async fn save_index(&self, index: &StorageIndex) -> Result<()> {
        let content =
            serde_json::to_string_pretty(index).map_err(|e| StorageError::DataConversionError {
                message: "Failed to serialize index".to_string(),
                source: Some(eyre::eyre!("JSON error: {}", e)),
            })?;

        let staging_path = self
            .root_path
            .join(format!(".index-{}.json", uuid::Uuid::new_v4()));

        fs::write(&staging_path, content)
            .await
            .map_err(|e| StorageError::backend(format!("Failed to write index file: {e}")))?;

        if let Err(e) = fs::rename(&staging_path, self.index_path()).await {
            let _ = fs::remove_file(&staging_path).await;
            return Err(StorageError::backend(format!(
                "Failed to swap index file: {e}"
            )));
        }

        Ok(())
    }

    async fn remove_blob(&self, blob: &str) {
        if let Err(e) = fs::remove_file(self.blob_path(blob)).await {
            warn!("Failed to remove stale blob {}: {}", blob, e);
        }
    }
}

#[async_trait]
impl DistributedFilesStore for FilesystemStorage {
    async fn replace(&self, file: DistributedFile) -> Result<Vec<DistributedFileInfo>> {
        super::ensure_file_name(&file)?;

        let _guard = self.lock.write().await;
        let _dir_lock = self.lock_directory(LockMode::Exclusive).await?;
        let mut index = self.load_index().await?;

        let blob = format!("{}.bin", uuid::Uuid::new_v4());
        fs::create_dir_all(self.blobs_dir())
            .await
            .map_err(|e| StorageError::backend(format!("Failed to create blobs directory: {e}")))?;
        fs::write(self.blob_path(&blob), &file.file_data)
            .await
            .map_err(|e| StorageError::operation("write blob", e))?;

        let (displaced, kept): (Vec<IndexedFile>, Vec<IndexedFile>) =
            index.files.into_iter().partition(|existing| {
                existing.file_name == file.file_name
                    || existing.content_identifier == file.content_identifier
            });

        index.files = kept;
        index.files.push(IndexedFile {
            file_name: file.file_name.clone(),
            content_identifier: file.content_identifier.clone(),
            updated_at: file.updated_at,
            size: file.file_data.len() as u64,
            blob: blob.clone(),
        });
        index.files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        index.last_updated = Some(Utc::now());

        if let Err(e) = self.save_index(&index).await {
            self.remove_blob(&blob).await;
            return Err(e);
        }

        for stale in &displaced {
            self.remove_blob(&stale.blob).await;
        }

        debug!(
            "Replaced {} ({} bytes), displaced {} row(s)",
            file.file_name,
            file.file_data.len(),
            displaced.len()
        );

        Ok(displaced.iter().map(IndexedFile::info).collect())
    }

    async fn get(&self, file_name: &str) -> Result<Option<DistributedFile>> {
        let _guard = self.lock.read().await;
        let _dir_lock = self.lock_directory(LockMode::Shared).await?;
        let index = self.load_index().await?;

        let Some(entry) = index.files.into_iter().find(|f| f.file_name == file_name) else {
            return Ok(None);
        };

        let file_data = fs::read(self.blob_path(&entry.blob)).await.map_err(|e| {
            StorageError::operation("read blob", format!("{} ({}): {}", entry.file_name, entry.blob, e))
        })?;

        Ok(Some(DistributedFile {
            file_name: entry.file_name,
            content_identifier: entry.content_identifier,
            file_data,
            updated_at: entry.updated_at,
        }))
    }

    async fn info(&self, file_name: &str) -> Result<Option<DistributedFileInfo>> {
        let _guard = self.lock.read().await;
        let _dir_lock = self.lock_directory(LockMode::Shared).await?;
        let index = self.load_index().await?;

        Ok(index
            .files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(IndexedFile::info))
    }

    async fn find_by_content_identifier(
        &self,
        content_identifier: &ContentIdentifier,
    ) -> Result<Vec<DistributedFileInfo>> {
        let _guard = self.lock.read().await;
        let _dir_lock = self.lock_directory(LockMode::Shared).await?;
        let index = self.load_index().await?;

        Ok(index
            .files
            .iter()
            .filter(|f| &f.content_identifier == content_identifier)
            .map(IndexedFile::info)
            .collect())
    }

    async fn list(&self) -> Result<Vec<DistributedFileInfo>> {
        let _guard = self.lock.read().await;
        let _dir_lock = self.lock_directory(LockMode::Shared).await?;
        let index = self.load_index().await?;

        Ok(index.files.iter().map(IndexedFile::info).collect())
    }

    async fn remove(&self, file_name: &str) -> Result<bool> {
        let _guard = self.lock.write().await;
        let _dir_lock = self.lock_directory(LockMode::Exclusive).await?;
        let mut index = self.load_index().await?;

        let Some(position) = index.files.iter().position(|f| f.file_name == file_name) else {
            return Ok(false);
        };

        let removed = index.files.remove(position);
        index.last_updated = Some(Utc::now());
        self.save_index(&index).await?;
        self.remove_blob(&removed.blob).await;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_creates_empty_index() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        assert!(temp_dir.path().join("index.json").exists());
        assert!(temp_dir.path().join("blobs").is_dir());
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_removes_stale_blob() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FilesystemStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let id = ContentIdentifier::new("MONITORING");
        storage
            .replace(DistributedFile::new("monitoring.xml", id.clone(), b"v1".to_vec()))
            .await
            .unwrap();
        storage
            .replace(DistributedFile::new("monitoring.xml", id, b"v2".to_vec()))
            .await
            .unwrap();

        let blobs = std::fs::read_dir(temp_dir.path().join("blobs")).unwrap().count();
        assert_eq!(blobs, 1);

        let stored = storage.get("monitoring.xml").await.unwrap().unwrap();
        assert_eq!(stored.file_data, b"v2");
    }
}
