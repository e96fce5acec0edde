//! In-memory storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use confparts_types::{ContentIdentifier, DistributedFile, DistributedFileInfo};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::DistributedFilesStore;

/// Store that keeps every row in process memory.
///
/// Contents are lost when the process exits. Useful for tests and for
/// embedding the registry without persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<String, DistributedFile>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedFilesStore for MemoryStorage {
    async fn replace(&self, file: DistributedFile) -> Result<Vec<DistributedFileInfo>> {
        super::ensure_file_name(&file)?;

        let mut files = self.files.write().await;

        let displaced_names: Vec<String> = files
            .values()
            .filter(|existing| {
                existing.file_name == file.file_name
                    || existing.content_identifier == file.content_identifier
            })
            .map(|existing| existing.file_name.clone())
            .collect();

        let displaced = displaced_names
            .iter()
            .filter_map(|name| files.remove(name))
            .map(|removed| removed.info())
            .collect();

        files.insert(file.file_name.clone(), file);
        Ok(displaced)
    }

    async fn get(&self, file_name: &str) -> Result<Option<DistributedFile>> {
        Ok(self.files.read().await.get(file_name).cloned())
    }

    async fn info(&self, file_name: &str) -> Result<Option<DistributedFileInfo>> {
        Ok(self.files.read().await.get(file_name).map(DistributedFile::info))
    }

    async fn find_by_content_identifier(
        &self,
        content_identifier: &ContentIdentifier,
    ) -> Result<Vec<DistributedFileInfo>> {
        Ok(self
            .files
            .read()
            .await
            .values()
            .filter(|file| &file.content_identifier == content_identifier)
            .map(DistributedFile::info)
            .collect())
    }

    async fn list(&self) -> Result<Vec<DistributedFileInfo>> {
        Ok(self
            .files
            .read()
            .await
            .values()
            .map(DistributedFile::info)
            .collect())
    }

    async fn remove(&self, file_name: &str) -> Result<bool> {
        Ok(self.files.write().await.remove(file_name).is_some())
    }
}
