//! Static knowledge of the required configuration parts.

use confparts_types::{ContentIdentifier, SourceType};

use crate::error::{RegistryError, Result};

pub const FILE_NAME_PRIVATE_PARAMETERS: &str = "private-params.xml";
pub const FILE_NAME_SHARED_PARAMETERS: &str = "shared-params.xml";

/// A configuration part every internal source must publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPart {
    pub content_identifier: ContentIdentifier,
    pub file_name: &'static str,
}

/// Canonical file name of each required content identifier.
pub static REQUIRED_PARTS: [RequiredPart; 2] = [
    RequiredPart {
        content_identifier: ContentIdentifier::PRIVATE_PARAMETERS,
        file_name: FILE_NAME_PRIVATE_PARAMETERS,
    },
    RequiredPart {
        content_identifier: ContentIdentifier::SHARED_PARAMETERS,
        file_name: FILE_NAME_SHARED_PARAMETERS,
    },
];

/// What an external source publishes, in manifest order.
pub static EXTERNAL_SOURCE_CONTENT_IDENTIFIERS: [ContentIdentifier; 1] =
    [ContentIdentifier::SHARED_PARAMETERS];

/// What an internal source must publish before optional parts, in manifest order.
pub static INTERNAL_SOURCE_REQUIRED_CONTENT_IDENTIFIERS: [ContentIdentifier; 2] = [
    ContentIdentifier::PRIVATE_PARAMETERS,
    ContentIdentifier::SHARED_PARAMETERS,
];

pub fn required_identifiers(source_type: SourceType) -> &'static [ContentIdentifier] {
    match source_type {
        SourceType::External => &EXTERNAL_SOURCE_CONTENT_IDENTIFIERS,
        SourceType::Internal => &INTERNAL_SOURCE_REQUIRED_CONTENT_IDENTIFIERS,
    }
}

pub fn required_identifier_for_file_name(file_name: &str) -> Option<ContentIdentifier> {
    REQUIRED_PARTS
        .iter()
        .find(|part| part.file_name == file_name)
        .map(|part| part.content_identifier.clone())
}

/// Canonical file name of a required content identifier.
pub fn file_name_for_identifier(content_identifier: &ContentIdentifier) -> Result<&'static str> {
    REQUIRED_PARTS
        .iter()
        .find(|part| &part.content_identifier == content_identifier)
        .map(|part| part.file_name)
        .ok_or_else(|| RegistryError::UnknownContentIdentifier(content_identifier.clone()))
}

pub fn is_reserved_file_name(file_name: &str) -> bool {
    REQUIRED_PARTS.iter().any(|part| part.file_name == file_name)
}

pub fn is_reserved_identifier(content_identifier: &ContentIdentifier) -> bool {
    REQUIRED_PARTS
        .iter()
        .any(|part| &part.content_identifier == content_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_file_names_resolve_both_ways() {
        for part in &REQUIRED_PARTS {
            assert_eq!(
                required_identifier_for_file_name(part.file_name).as_ref(),
                Some(&part.content_identifier)
            );
            assert_eq!(
                file_name_for_identifier(&part.content_identifier).unwrap(),
                part.file_name
            );
        }
    }

    #[test]
    fn test_unknown_identifier_is_an_unknown_mapping() {
        let err = file_name_for_identifier(&ContentIdentifier::new("MONITORING")).unwrap_err();
        assert!(err.is_unknown_mapping());
        assert!(required_identifier_for_file_name("monitoring.xml").is_none());
    }

    #[test]
    fn test_source_sets() {
        assert_eq!(
            required_identifiers(SourceType::External),
            [ContentIdentifier::SHARED_PARAMETERS]
        );
        assert_eq!(
            required_identifiers(SourceType::Internal),
            [
                ContentIdentifier::PRIVATE_PARAMETERS,
                ContentIdentifier::SHARED_PARAMETERS
            ]
        );
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_file_name(FILE_NAME_SHARED_PARAMETERS));
        assert!(is_reserved_identifier(&ContentIdentifier::PRIVATE_PARAMETERS));
        assert!(!is_reserved_file_name("monitoring.xml"));
    }
}
