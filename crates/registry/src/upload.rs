//! Accepting uploads of optional configuration parts.

use std::sync::Arc;

use confparts_types::DistributedFileInfo;
use confparts_validator::ExternalValidator;
use tracing::{info, warn};

use crate::error::{RegistryError, Result};
use crate::registry::DistributedFilesRegistry;

/// An upload that was validated and published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub file: DistributedFileInfo,
    /// Non-fatal diagnostics from the validation program.
    pub warnings: Vec<String>,
}

/// Validates uploaded optional parts and publishes what the validation
/// program accepts.
#[derive(Debug, Clone)]
pub struct OptionalPartUploader {
    registry: Arc<DistributedFilesRegistry>,
    validator: ExternalValidator,
}

impl OptionalPartUploader {
    pub fn new(registry: Arc<DistributedFilesRegistry>, validator: ExternalValidator) -> Self {
        Self {
            registry,
            validator,
        }
    }

    pub fn registry(&self) -> &Arc<DistributedFilesRegistry> {
        &self.registry
    }

    /// Validate `file_bytes` with the program registered for `file_name` and
    /// save the validated content.
    ///
    /// Nothing is stored when validation fails.
    pub async fn upload(&self, file_name: &str, file_bytes: Vec<u8>) -> Result<UploadOutcome> {
        if file_name.trim().is_empty() {
            return Err(RegistryError::MissingFileName);
        }

        let descriptor = self
            .registry
            .optional_parts()
            .descriptor_for_file_name(file_name)
            .await?
            .ok_or_else(|| RegistryError::UnknownFileName(file_name.to_string()))?;

        let (validated_bytes, warnings) = match &descriptor.validation_program {
            Some(program) => {
                let part = self
                    .validator
                    .run(program, &file_bytes, &descriptor.content_identifier)
                    .await?;
                (part.validated_bytes, part.warnings)
            }
            None => {
                warn!(
                    "No validation program registered for {}, accepting upload as is",
                    descriptor.content_identifier
                );
                (file_bytes, Vec::new())
            }
        };

        let file = self
            .registry
            .save_configuration_part(file_name, validated_bytes)
            .await?;

        info!(
            "Accepted upload of {} with {} warning(s)",
            file.file_name,
            warnings.len()
        );

        Ok(UploadOutcome { file, warnings })
    }
}
