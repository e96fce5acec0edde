//! The registry of distributed configuration parts.

use std::sync::Arc;

use confparts_storage::DistributedFilesStore;
use confparts_types::{
    ConfigurationPartEntry, ContentIdentifier, DistributedFile, DistributedFileInfo,
    OptionalPartDescriptor, SourceType,
};
use tracing::{debug, info};

use crate::catalog;
use crate::error::{RegistryError, Result};
use crate::optional_parts::OptionalPartsSource;

/// Tracks which configuration parts are published and what they contain.
///
/// Combines the static catalog of required parts, the installed optional
/// parts and the stored files into manifests per source type.
#[derive(Clone)]
pub struct DistributedFilesRegistry {
    store: Arc<dyn DistributedFilesStore>,
    optional_parts: Arc<dyn OptionalPartsSource>,
}

impl DistributedFilesRegistry {
    pub fn new(
        store: Arc<dyn DistributedFilesStore>,
        optional_parts: Arc<dyn OptionalPartsSource>,
    ) -> Self {
        Self {
            store,
            optional_parts,
        }
    }

    pub fn store(&self) -> &Arc<dyn DistributedFilesStore> {
        &self.store
    }

    pub fn optional_parts(&self) -> &Arc<dyn OptionalPartsSource> {
        &self.optional_parts
    }

    /// Resolve the content identifier a file is published under.
    ///
    /// Required file names are resolved from the catalog, anything else from
    /// the installed optional parts.
    pub async fn identifier_for_file_name(&self, file_name: &str) -> Result<ContentIdentifier> {
        if file_name.trim().is_empty() {
            return Err(RegistryError::MissingFileName);
        }

        if let Some(identifier) = catalog::required_identifier_for_file_name(file_name) {
            return Ok(identifier);
        }

        self.optional_parts
            .identifier_for_file_name(file_name)
            .await?
            .ok_or_else(|| RegistryError::UnknownFileName(file_name.to_string()))
    }

    /// Resolve the file name a content identifier is published under.
    pub async fn file_name_for_identifier(
        &self,
        content_identifier: &ContentIdentifier,
    ) -> Result<String> {
        if let Ok(file_name) = catalog::file_name_for_identifier(content_identifier) {
            return Ok(file_name.to_string());
        }

        self.optional_parts
            .all_parts()
            .await?
            .into_iter()
            .find(|part| &part.content_identifier == content_identifier)
            .map(|part| part.file_name)
            .ok_or_else(|| RegistryError::UnknownContentIdentifier(content_identifier.clone()))
    }

    /// Publish a new version of a file, replacing the previous one.
    pub async fn save_configuration_part(
        &self,
        file_name: &str,
        file_data: Vec<u8>,
    ) -> Result<DistributedFileInfo> {
        let content_identifier = self.identifier_for_file_name(file_name).await?;

        let file = DistributedFile::new(file_name, content_identifier, file_data);
        let saved = file.info();
        let displaced = self.store.replace(file).await?;

        info!(
            "Saved configuration part {} ({}, {} bytes), replaced {} previous version(s)",
            saved.file_name,
            saved.content_identifier,
            saved.size,
            displaced.len()
        );

        Ok(saved)
    }

    pub async fn get_configuration_part(&self, file_name: &str) -> Result<Option<DistributedFile>> {
        Ok(self.store.get(file_name).await?)
    }

    /// Remove a published file, e.g. when the anchor referring to it is deleted.
    pub async fn remove_configuration_part(&self, file_name: &str) -> Result<bool> {
        if file_name.trim().is_empty() {
            return Err(RegistryError::MissingFileName);
        }

        let removed = self.store.remove(file_name).await?;
        if removed {
            info!("Removed configuration part {}", file_name);
        }
        Ok(removed)
    }

    /// Configuration parts a source of the given type publishes.
    ///
    /// Required parts come first in catalog order; internal sources are
    /// followed by every installed optional part in enumeration order. A
    /// required part that was never saved is listed under its canonical file
    /// name without a timestamp.
    pub async fn configuration_parts(
        &self,
        source_type: SourceType,
    ) -> Result<Vec<ConfigurationPartEntry>> {
        let mut entries = self
            .required_configuration_parts(catalog::required_identifiers(source_type))
            .await?;

        if source_type == SourceType::Internal {
            let optional_parts = self.optional_parts.all_parts().await?;
            entries.extend(self.optional_configuration_parts(optional_parts).await?);
        }

        debug!("Built {} manifest with {} entries", source_type, entries.len());
        Ok(entries)
    }

    /// [`Self::configuration_parts`] as a JSON array.
    pub async fn configuration_parts_json(
        &self,
        source_type: SourceType,
    ) -> Result<serde_json::Value> {
        let entries = self.configuration_parts(source_type).await?;
        Ok(serde_json::to_value(entries)?)
    }

    /// Every content identifier an internal source may publish: the required
    /// ones followed by the installed optional ones.
    pub async fn internal_source_content_identifiers(&self) -> Result<Vec<ContentIdentifier>> {
        let mut identifiers = catalog::required_identifiers(SourceType::Internal).to_vec();

        identifiers.extend(
            self.optional_parts
                .all_parts()
                .await?
                .into_iter()
                .map(|part| part.content_identifier),
        );

        Ok(identifiers)
    }

    async fn required_configuration_parts(
        &self,
        content_identifiers: &[ContentIdentifier],
    ) -> Result<Vec<ConfigurationPartEntry>> {
        let mut entries = Vec::with_capacity(content_identifiers.len());

        for content_identifier in content_identifiers {
            let stored = self
                .store
                .find_by_content_identifier(content_identifier)
                .await?;

            if stored.is_empty() {
                entries.push(ConfigurationPartEntry::required(
                    content_identifier.clone(),
                    catalog::file_name_for_identifier(content_identifier)?,
                    None,
                ));
                continue;
            }

            entries.extend(stored.into_iter().map(|file| {
                ConfigurationPartEntry::required(
                    content_identifier.clone(),
                    file.file_name,
                    Some(file.updated_at),
                )
            }));
        }

        Ok(entries)
    }

    async fn optional_configuration_parts(
        &self,
        optional_parts: Vec<OptionalPartDescriptor>,
    ) -> Result<Vec<ConfigurationPartEntry>> {
        let mut entries = Vec::with_capacity(optional_parts.len());

        for part in optional_parts {
            let stored = self.store.info(&part.file_name).await?;
            entries.push(ConfigurationPartEntry::optional(
                part.content_identifier,
                part.file_name,
                stored.map(|file| file.updated_at),
            ));
        }

        Ok(entries)
    }
}

impl std::fmt::Debug for DistributedFilesRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedFilesRegistry").finish_non_exhaustive()
    }
}
