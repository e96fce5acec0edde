//! Replace-only write semantics shared by every backend.

mod common;

use std::sync::Arc;

use common::{
    check_blank_file_name_rejected, check_remove, check_same_identifier_replaces,
    check_same_name_replaces,
};
use confparts_storage::{DistributedFilesStore, FilesystemStorage, MemoryStorage};
use confparts_types::{ContentIdentifier, DistributedFile};
use tempfile::TempDir;

#[tokio::test]
async fn test_memory_backend_replace_semantics() {
    let storage = MemoryStorage::new();
    check_same_name_replaces(&storage).await;
    check_same_identifier_replaces(&storage).await;
    check_remove(&storage).await;
    check_blank_file_name_rejected(&storage).await;

    let names: Vec<String> = storage
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|info| info.file_name)
        .collect();
    assert_eq!(names, vec!["monitoring.xml", "shared-params.xml"]);
}

#[tokio::test]
async fn test_filesystem_backend_replace_semantics() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FilesystemStorage::new(temp_dir.path());
    storage.initialize().await.unwrap();

    check_same_name_replaces(&storage).await;
    check_same_identifier_replaces(&storage).await;
    check_remove(&storage).await;
    check_blank_file_name_rejected(&storage).await;
}

#[tokio::test]
async fn test_filesystem_backend_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let storage = FilesystemStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();
        storage
            .replace(DistributedFile::new(
                "shared-params.xml",
                ContentIdentifier::SHARED_PARAMETERS,
                b"<conf/>".to_vec(),
            ))
            .await
            .unwrap();
    }

    let reopened = FilesystemStorage::new(temp_dir.path());
    reopened.initialize().await.unwrap();

    let stored = reopened.get("shared-params.xml").await.unwrap().unwrap();
    assert_eq!(stored.content_identifier, ContentIdentifier::SHARED_PARAMETERS);
    assert_eq!(stored.file_data, b"<conf/>");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_missing_row_during_replace() {
    let temp_dir = TempDir::new().unwrap();
    let filesystem = FilesystemStorage::new(temp_dir.path());
    filesystem.initialize().await.unwrap();

    let backends: Vec<Arc<dyn DistributedFilesStore>> =
        vec![Arc::new(MemoryStorage::new()), Arc::new(filesystem)];

    for storage in backends {
        storage
            .replace(DistributedFile::new(
                "shared-params.xml",
                ContentIdentifier::SHARED_PARAMETERS,
                b"v0".to_vec(),
            ))
            .await
            .unwrap();

        let writer = {
            let storage = storage.clone();
            tokio::spawn(async move {
                for version in 1..=25 {
                    storage
                        .replace(DistributedFile::new(
                            "shared-params.xml",
                            ContentIdentifier::SHARED_PARAMETERS,
                            format!("v{version}").into_bytes(),
                        ))
                        .await
                        .unwrap();
                }
            })
        };

        let reader = {
            let storage = storage.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    let rows = storage
                        .find_by_content_identifier(&ContentIdentifier::SHARED_PARAMETERS)
                        .await
                        .unwrap();
                    assert_eq!(rows.len(), 1);
                    assert!(storage.get("shared-params.xml").await.unwrap().is_some());
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();

        let stored = storage.get("shared-params.xml").await.unwrap().unwrap();
        assert_eq!(stored.file_data, b"v25");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_filesystem_handles_on_one_root_keep_every_write() {
    let temp_dir = TempDir::new().unwrap();
    let first = Arc::new(FilesystemStorage::new(temp_dir.path()));
    let second = Arc::new(FilesystemStorage::new(temp_dir.path()));
    first.initialize().await.unwrap();
    second.initialize().await.unwrap();

    let writers: Vec<_> = [("a", first), ("b", second)]
        .into_iter()
        .map(|(prefix, storage)| {
            tokio::spawn(async move {
                for n in 0..20 {
                    storage
                        .replace(DistributedFile::new(
                            format!("{prefix}{n}.xml"),
                            ContentIdentifier::new(format!("{}{n}", prefix.to_uppercase())),
                            format!("{prefix}{n}").into_bytes(),
                        ))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.await.unwrap();
    }

    let third = FilesystemStorage::new(temp_dir.path());
    let rows = third.list().await.unwrap();
    assert_eq!(rows.len(), 40);

    for n in 0..20 {
        for prefix in ["a", "b"] {
            let stored = third.get(&format!("{prefix}{n}.xml")).await.unwrap().unwrap();
            assert_eq!(stored.file_data, format!("{prefix}{n}").into_bytes());
        }
    }

    let blobs = std::fs::read_dir(temp_dir.path().join("blobs")).unwrap().count();
    assert_eq!(blobs, 40);
}
