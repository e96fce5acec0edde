//! Backend implementations for the distributed files store.
//!
//! This module contains the in-memory, filesystem and (with the `postgres`
//! feature) PostgreSQL backends.

pub mod filesystem;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export the backends for convenience
pub use filesystem::FilesystemStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStorage;

use confparts_types::DistributedFile;

use crate::error::{Result, StorageError};

/// Every backend refuses rows without a usable key.
pub(crate) fn ensure_file_name(file: &DistributedFile) -> Result<()> {
    if file.file_name.trim().is_empty() {
        return Err(StorageError::InvalidFileData {
            message: "File name cannot be empty".to_string(),
            source: None,
        });
    }
    Ok(())
}
