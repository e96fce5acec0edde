//! Uploading optional parts through a validation program.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use confparts_registry::{
    DistributedFilesRegistry, OptionalPartUploader, RegistryError, StaticOptionalParts,
};
use confparts_storage::{DistributedFilesStore, MemoryStorage};
use confparts_types::{OptionalPartDescriptor, SourceType};
use confparts_validator::{ExternalValidator, ValidationError, ValidatorConfig};
use tempfile::TempDir;

const NORMALIZE: &str = "\
#!/bin/sh
echo \"normalizing $1\" >&2
tr 'a-z' 'A-Z'
";

const REJECT: &str = "\
#!/bin/sh
echo 'Missing root element' >&2
exit 3
";

fn scripts() -> &'static Path {
    static SCRIPTS: OnceLock<TempDir> = OnceLock::new();
    SCRIPTS
        .get_or_init(|| {
            let dir = TempDir::new().unwrap();
            for (name, body) in [("normalize.sh", NORMALIZE), ("reject.sh", REJECT)] {
                let path = dir.path().join(name);
                std::fs::write(&path, body).unwrap();
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            }
            dir
        })
        .path()
}

fn script(name: &str) -> PathBuf {
    scripts().join(name)
}

fn uploader() -> (OptionalPartUploader, Arc<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::new());
    let parts = StaticOptionalParts::new(vec![
        OptionalPartDescriptor::new(
            "MONITORING",
            "monitoring-params.xml",
            Some(script("normalize.sh")),
        ),
        OptionalPartDescriptor::new("STRICT", "strict.xml", Some(script("reject.sh"))),
        OptionalPartDescriptor::new("UNCHECKED", "unchecked.xml", None),
    ]);
    let registry = Arc::new(DistributedFilesRegistry::new(store.clone(), Arc::new(parts)));
    let validator = ExternalValidator::new(ValidatorConfig::default().with_timeout(Some(10)));

    (OptionalPartUploader::new(registry, validator), store)
}

#[tokio::test]
async fn test_upload_stores_validated_output() {
    let (uploader, store) = uploader();

    let outcome = uploader
        .upload("monitoring-params.xml", b"<monitoring/>".to_vec())
        .await
        .unwrap();

    assert_eq!(outcome.warnings, vec!["normalizing MONITORING"]);
    assert_eq!(outcome.file.content_identifier.as_str(), "MONITORING");

    let stored = store.get("monitoring-params.xml").await.unwrap().unwrap();
    assert_eq!(stored.file_data, b"<MONITORING/>");
    assert_eq!(outcome.file.size, stored.file_data.len() as u64);
}

#[tokio::test]
async fn test_rejected_upload_is_not_stored() {
    let (uploader, store) = uploader();

    let err = uploader
        .upload("strict.xml", b"garbage".to_vec())
        .await
        .unwrap_err();

    match err {
        RegistryError::Validation(ValidationError::Rejected { status, stderr, .. }) => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr, vec!["Missing root element"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.get("strict.xml").await.unwrap().is_none());
}

#[tokio::test]
async fn test_part_without_program_is_accepted_as_is() {
    let (uploader, store) = uploader();

    let outcome = uploader
        .upload("unchecked.xml", b"anything".to_vec())
        .await
        .unwrap();

    assert!(outcome.warnings.is_empty());
    let stored = store.get("unchecked.xml").await.unwrap().unwrap();
    assert_eq!(stored.file_data, b"anything");
}

#[tokio::test]
async fn test_upload_of_unregistered_or_required_part_fails() {
    let (uploader, store) = uploader();

    let err = uploader.upload("unknown.xml", b"x".to_vec()).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnknownFileName(name) if name == "unknown.xml"));

    let err = uploader
        .upload("shared-params.xml", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(err.is_unknown_mapping());

    let err = uploader.upload("", b"x".to_vec()).await.unwrap_err();
    assert!(matches!(err, RegistryError::MissingFileName));

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_uploaded_part_shows_up_in_internal_manifest() {
    let (uploader, _store) = uploader();

    let outcome = uploader
        .upload("unchecked.xml", b"data".to_vec())
        .await
        .unwrap();

    let entries = uploader
        .registry()
        .configuration_parts(SourceType::Internal)
        .await
        .unwrap();
    assert_eq!(entries.len(), 5);

    let unchecked = entries
        .iter()
        .find(|entry| entry.file_name == "unchecked.xml")
        .unwrap();
    assert!(unchecked.optional);
    assert_eq!(unchecked.updated_at, Some(outcome.file.updated_at));
}
