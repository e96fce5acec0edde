//! Checks every backend must pass.

use confparts_storage::{DistributedFilesStore, StorageError};
use confparts_types::{ContentIdentifier, DistributedFile};

pub async fn check_same_name_replaces(storage: &dyn DistributedFilesStore) {
    let id = ContentIdentifier::SHARED_PARAMETERS;

    let first = DistributedFile::new("shared-params.xml", id.clone(), b"first".to_vec());
    let displaced = storage.replace(first.clone()).await.unwrap();
    assert!(displaced.is_empty());

    let second = DistributedFile::new("shared-params.xml", id.clone(), b"second".to_vec());
    let displaced = storage.replace(second.clone()).await.unwrap();
    assert_eq!(displaced.len(), 1);
    assert_eq!(displaced[0].updated_at, first.updated_at);

    let rows = storage.find_by_content_identifier(&id).await.unwrap();
    assert_eq!(rows.len(), 1, "saving the same file twice must leave one row");
    assert_eq!(rows[0].updated_at, second.updated_at);
    assert_eq!(rows[0].size, 6);

    let stored = storage.get("shared-params.xml").await.unwrap().unwrap();
    assert_eq!(stored.file_data, b"second");
}

pub async fn check_same_identifier_replaces(storage: &dyn DistributedFilesStore) {
    let id = ContentIdentifier::new("MONITORING");

    storage
        .replace(DistributedFile::new("monitoring-old.xml", id.clone(), b"old".to_vec()))
        .await
        .unwrap();
    let displaced = storage
        .replace(DistributedFile::new("monitoring.xml", id.clone(), b"new".to_vec()))
        .await
        .unwrap();

    assert_eq!(displaced.len(), 1);
    assert_eq!(displaced[0].file_name, "monitoring-old.xml");

    let rows = storage.find_by_content_identifier(&id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "monitoring.xml");
    assert!(storage.info("monitoring-old.xml").await.unwrap().is_none());
}

pub async fn check_remove(storage: &dyn DistributedFilesStore) {
    storage
        .replace(DistributedFile::new(
            "private-params.xml",
            ContentIdentifier::PRIVATE_PARAMETERS,
            b"private".to_vec(),
        ))
        .await
        .unwrap();

    assert!(storage.remove("private-params.xml").await.unwrap());
    assert!(!storage.remove("private-params.xml").await.unwrap());
    assert!(storage.get("private-params.xml").await.unwrap().is_none());
}

pub async fn check_blank_file_name_rejected(storage: &dyn DistributedFilesStore) {
    for file_name in ["", "  "] {
        let result = storage
            .replace(DistributedFile::new(
                file_name,
                ContentIdentifier::new("BLANK"),
                b"data".to_vec(),
            ))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidFileData { .. })));
    }

    let rows = storage
        .find_by_content_identifier(&ContentIdentifier::new("BLANK"))
        .await
        .unwrap();
    assert!(rows.is_empty());
}
