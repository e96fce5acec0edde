//! Published files and optional part registrations.

use std::path::PathBuf;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::identifier::ContentIdentifier;

/// A file currently published by the central server.
///
/// Rows are keyed by `file_name` and are only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedFile {
    pub file_name: String,
    pub content_identifier: ContentIdentifier,
    pub file_data: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

impl DistributedFile {
    /// Create a new row stamped with the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision every
    /// backend stores.
    pub fn new(
        file_name: impl Into<String>,
        content_identifier: ContentIdentifier,
        file_data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_identifier,
            file_data,
            updated_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Metadata view of this row, without the content bytes.
    pub fn info(&self) -> DistributedFileInfo {
        DistributedFileInfo {
            file_name: self.file_name.clone(),
            content_identifier: self.content_identifier.clone(),
            updated_at: self.updated_at,
            size: self.file_data.len() as u64,
        }
    }
}

/// Metadata of a published file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedFileInfo {
    pub file_name: String,
    pub content_identifier: ContentIdentifier,
    pub updated_at: DateTime<Utc>,
    pub size: u64,
}

/// An optional configuration part installed on the server.
///
/// Descriptors are discovered at query time and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalPartDescriptor {
    pub content_identifier: ContentIdentifier,
    pub file_name: String,
    /// Program that validates uploads of this part. Uploads are accepted
    /// unchanged when no program is registered.
    pub validation_program: Option<PathBuf>,
}

impl OptionalPartDescriptor {
    pub fn new(
        content_identifier: impl Into<ContentIdentifier>,
        file_name: impl Into<String>,
        validation_program: Option<PathBuf>,
    ) -> Self {
        Self {
            content_identifier: content_identifier.into(),
            file_name: file_name.into(),
            validation_program,
        }
    }
}
