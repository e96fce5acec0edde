use std::path::PathBuf;

use confparts_storage::StorageError;
use confparts_types::ContentIdentifier;
use confparts_validator::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("File name must be provided")]
    MissingFileName,

    #[error("No content identifier is mapped to file name '{0}'")]
    UnknownFileName(String),

    #[error("No file name is mapped to content identifier '{0}'")]
    UnknownContentIdentifier(ContentIdentifier),

    #[error("Failed to read optional parts directory '{path}': {source}")]
    OptionalPartsDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RegistryError {
    /// Whether a file name or content identifier could not be resolved.
    pub fn is_unknown_mapping(&self) -> bool {
        matches!(
            self,
            RegistryError::UnknownFileName(_) | RegistryError::UnknownContentIdentifier(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
