//! Error types for the distributed files store.

use thiserror::Error;

/// Errors that can occur during distributed file storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file data: {message}")]
    InvalidFileData {
        message: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Data conversion failed: {message}")]
    DataConversionError {
        message: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Storage operation failed: {operation}")]
    StorageOperationFailed {
        operation: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Storage backend error")]
    BackendError {
        #[source]
        source: Option<eyre::Report>,
    },
}

impl StorageError {
    pub(crate) fn backend(message: impl std::fmt::Display) -> Self {
        StorageError::BackendError {
            source: Some(eyre::eyre!("{}", message)),
        }
    }

    pub(crate) fn operation(operation: &str, message: impl std::fmt::Display) -> Self {
        StorageError::StorageOperationFailed {
            operation: operation.to_string(),
            source: Some(eyre::eyre!("{}", message)),
        }
    }
}

/// Result type alias for distributed file storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
