//! Discovery of installed optional configuration parts.
//!
//! Optional parts are registered by dropping an `.ini` file into a directory:
//!
//! ```text
//! # /etc/confparts/optional-parts/monitoring.ini
//! content-identifier = MONITORING
//! file-name = monitoring-params.xml
//! validation-program = /usr/share/confparts/validate-monitoring.sh
//! ```
//!
//! `validation-program` may be left out, in which case uploads of the part are
//! accepted without validation.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use confparts_types::{ContentIdentifier, OptionalPartDescriptor};
use tokio::fs;
use tracing::{debug, warn};

use crate::catalog;
use crate::error::{RegistryError, Result};

const REGISTRATION_EXTENSION: &str = "ini";

/// Anything that can enumerate the optional parts installed on the server.
#[async_trait]
pub trait OptionalPartsSource: Send + Sync {
    /// All installed optional parts, in enumeration order.
    async fn all_parts(&self) -> Result<Vec<OptionalPartDescriptor>>;

    /// The optional part published under `file_name`.
    async fn descriptor_for_file_name(
        &self,
        file_name: &str,
    ) -> Result<Option<OptionalPartDescriptor>> {
        Ok(self
            .all_parts()
            .await?
            .into_iter()
            .find(|part| part.file_name == file_name))
    }

    /// The content identifier of the optional part published under `file_name`.
    async fn identifier_for_file_name(&self, file_name: &str) -> Result<Option<ContentIdentifier>> {
        Ok(self
            .descriptor_for_file_name(file_name)
            .await?
            .map(|part| part.content_identifier))
    }
}

/// A fixed list of optional parts.
#[derive(Debug, Clone, Default)]
pub struct StaticOptionalParts {
    parts: Vec<OptionalPartDescriptor>,
}

impl StaticOptionalParts {
    pub fn new(parts: Vec<OptionalPartDescriptor>) -> Self {
        Self { parts }
    }

    /// No optional parts installed.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionalPartsSource for StaticOptionalParts {
    async fn all_parts(&self) -> Result<Vec<OptionalPartDescriptor>> {
        Ok(self.parts.clone())
    }
}

/// A registration file that was skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationError {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Result of scanning the optional parts directory.
#[derive(Debug, Clone, Default)]
pub struct OptionalPartsScan {
    pub parts: Vec<OptionalPartDescriptor>,
    pub errors: Vec<RegistrationError>,
}

/// Optional parts registered as `.ini` files in a directory.
///
/// The directory is re-read on every call so that installing or removing a
/// registration takes effect without a restart.
#[derive(Debug, Clone)]
pub struct DirectoryOptionalParts {
    directory: PathBuf,
}

impl DirectoryOptionalParts {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Read every registration in the directory.
    ///
    /// Registrations are processed in file name order and symbolic links are
    /// followed. Unreadable or malformed ones, ones
    /// that claim a required part's file name or content identifier, and ones
    /// repeating an earlier registration's file name or content identifier
    /// are skipped and reported in [`OptionalPartsScan::errors`].
    pub async fn scan(&self) -> Result<OptionalPartsScan> {
        let dir_error = |source| RegistryError::OptionalPartsDirectory {
            path: self.directory.clone(),
            source,
        };

        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "Optional parts directory {} does not exist, no optional parts installed",
                    self.directory.display()
                );
                return Ok(OptionalPartsScan::default());
            }
            Err(e) => return Err(dir_error(e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == REGISTRATION_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut scan = OptionalPartsScan::default();
        let mut seen_file_names = HashSet::new();
        let mut seen_identifiers = HashSet::new();

        for path in paths {
            // Symlinked registrations are followed.
            let registration = match fs::metadata(&path).await {
                Ok(metadata) if !metadata.is_file() => Err("is not a regular file".to_string()),
                Ok(_) => match fs::read_to_string(&path).await {
                    Ok(content) => parse_registration(&content),
                    Err(e) => Err(format!("cannot be read: {e}")),
                },
                Err(e) => Err(format!("cannot be read: {e}")),
            };

            let checked = registration.and_then(|part| {
                if catalog::is_reserved_file_name(&part.file_name) {
                    Err(format!("file name '{}' is reserved", part.file_name))
                } else if catalog::is_reserved_identifier(&part.content_identifier) {
                    Err(format!(
                        "content identifier '{}' is reserved",
                        part.content_identifier
                    ))
                } else if seen_file_names.contains(&part.file_name) {
                    Err(format!("file name '{}' is already registered", part.file_name))
                } else if seen_identifiers.contains(&part.content_identifier) {
                    Err(format!(
                        "content identifier '{}' is already registered",
                        part.content_identifier
                    ))
                } else {
                    Ok(part)
                }
            });

            match checked {
                Ok(part) => {
                    debug!(
                        "Found optional part {} ({}) in {}",
                        part.content_identifier,
                        part.file_name,
                        path.display()
                    );
                    seen_file_names.insert(part.file_name.clone());
                    seen_identifiers.insert(part.content_identifier.clone());
                    scan.parts.push(part);
                }
                Err(reason) => {
                    warn!("Skipping optional part registration {}: {}", path.display(), reason);
                    scan.errors.push(RegistrationError { path, reason });
                }
            }
        }

        Ok(scan)
    }
}

#[async_trait]
impl OptionalPartsSource for DirectoryOptionalParts {
    async fn all_parts(&self) -> Result<Vec<OptionalPartDescriptor>> {
        Ok(self.scan().await?.parts)
    }
}

/// Parse the `key = value` lines of a single registration.
fn parse_registration(content: &str) -> std::result::Result<OptionalPartDescriptor, String> {
    let mut content_identifier = None;
    let mut file_name = None;
    let mut validation_program = None;

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(format!("line {} is not a key = value pair", number + 1));
        };
        let value = value.trim();

        match key.trim() {
            "content-identifier" => content_identifier = Some(value.to_string()),
            "file-name" => file_name = Some(value.to_string()),
            "validation-program" => validation_program = Some(value.to_string()),
            _ => {}
        }
    }

    let content_identifier = content_identifier
        .filter(|id| !id.is_empty())
        .ok_or_else(|| "content-identifier is missing".to_string())?;
    let file_name = file_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "file-name is missing".to_string())?;
    let validation_program = validation_program
        .filter(|program| !program.is_empty())
        .map(PathBuf::from);

    Ok(OptionalPartDescriptor::new(
        content_identifier,
        file_name,
        validation_program,
    ))
}
