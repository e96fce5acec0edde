//! Trait definitions for the distributed files store.

use async_trait::async_trait;
use confparts_types::{ContentIdentifier, DistributedFile, DistributedFileInfo};

use crate::error::Result;

/// Keyed store of the files currently published by the central server.
///
/// Rows are unique by file name and by content identifier. The store is the
/// only owner of rows; callers replace or remove them as a whole.
#[async_trait]
pub trait DistributedFilesStore: Send + Sync {
    /// Atomically replace the current version of a file.
    ///
    /// Every existing row with the same file name or the same content
    /// identifier is removed and `file` is inserted in its place. Concurrent
    /// readers observe either the displaced rows or the new one, never a state
    /// where neither is present.
    ///
    /// # Returns
    /// Metadata of the rows that were displaced
    async fn replace(&self, file: DistributedFile) -> Result<Vec<DistributedFileInfo>>;

    /// Get a file with its content.
    ///
    /// # Returns
    /// `Some(file)` if found, `None` if not found
    async fn get(&self, file_name: &str) -> Result<Option<DistributedFile>>;

    /// Get the metadata of a file without loading its content.
    async fn info(&self, file_name: &str) -> Result<Option<DistributedFileInfo>>;

    /// All rows stored under a content identifier.
    async fn find_by_content_identifier(
        &self,
        content_identifier: &ContentIdentifier,
    ) -> Result<Vec<DistributedFileInfo>>;

    /// List the metadata of every stored file, ordered by file name.
    async fn list(&self) -> Result<Vec<DistributedFileInfo>>;

    /// Remove a file.
    ///
    /// # Returns
    /// `true` if the file was removed, `false` if it didn't exist
    async fn remove(&self, file_name: &str) -> Result<bool>;
}
