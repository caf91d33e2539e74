//! Storage behaviour over the in-memory Drive transport
//!
//! Each test builds its own transport, so tests run in parallel without
//! sharing state.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use gdrive_storage::config::Config;
use gdrive_storage::permission::{PermissionSet, RawPermission};
use gdrive_storage::storage::{GoogleDriveStorage, Listing, Storage, StorageOptions};
use gdrive_storage::transport::memory::{MemoryTransport, RemoteCall};
use gdrive_storage::transport::FOLDER_MIME_TYPE;
use gdrive_storage::StorageError;

fn setup() -> (Arc<MemoryTransport>, GoogleDriveStorage<MemoryTransport>) {
    setup_with(MemoryTransport::new(), StorageOptions::default())
}

fn setup_with(
    transport: MemoryTransport,
    options: StorageOptions,
) -> (Arc<MemoryTransport>, GoogleDriveStorage<MemoryTransport>) {
    let transport = Arc::new(transport);
    let storage = GoogleDriveStorage::with_transport(transport.clone(), options);
    (transport, storage)
}

fn as_set(entries: &[String]) -> HashSet<&str> {
    entries.iter().map(String::as_str).collect()
}

/// Saving into a missing folder creates it, and the content reads back intact
#[tokio::test]
async fn test_save_then_open_round_trip() {
    let (transport, storage) = setup();
    let data = Bytes::from_static(b"region,total\nnorth,10\nsouth,12\n");

    assert!(transport.folders_named("reports").is_empty());
    let name = storage.save("/reports/q1.csv", data.clone()).await.unwrap();
    assert_eq!(name, "/reports/q1.csv");
    assert_eq!(transport.folders_named("reports").len(), 1);

    let file = storage.open("/reports/q1.csv").await.unwrap();
    assert_eq!(file.name, "/reports/q1.csv");
    assert_eq!(file.content, data);
}

#[tokio::test]
async fn test_exists_after_save() {
    let (_, storage) = setup();
    let name = storage
        .save("docs/guide.md", Bytes::from_static(b"# Guide"))
        .await
        .unwrap();

    assert!(storage.exists(&name).await.unwrap());
    assert!(!storage.exists("docs/other.md").await.unwrap());
}

#[tokio::test]
async fn test_delete_then_exists_is_false() {
    let (transport, storage) = setup();
    storage
        .save("/tmp/scratch.bin", Bytes::from_static(b"\x01\x02"))
        .await
        .unwrap();

    storage.delete("/tmp/scratch.bin").await.unwrap();
    assert!(!storage.exists("/tmp/scratch.bin").await.unwrap());
    // The containing folder stays
    assert_eq!(transport.folders_named("tmp").len(), 1);
}

/// Single-segment names are not confined to the top level
#[tokio::test]
async fn test_top_level_name_searches_whole_drive() {
    let (_, storage) = setup();
    storage
        .save("/reports/q1.csv", Bytes::from_static(b"a,b\n"))
        .await
        .unwrap();

    assert!(storage.exists("q1.csv").await.unwrap());
    storage.delete("q1.csv").await.unwrap();
    assert!(!storage.exists("/reports/q1.csv").await.unwrap());
}

#[tokio::test]
async fn test_delete_missing_is_noop() {
    let (transport, storage) = setup();
    storage.delete("/nowhere/nothing.txt").await.unwrap();
    assert_eq!(transport.count_calls(RemoteCall::Delete), 0);
}

#[tokio::test]
async fn test_open_missing_is_not_found() {
    let (_, storage) = setup();
    let err = storage.open("/reports/missing.csv").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_absent_sentinels() {
    let (_, storage) = setup();
    let name = "/no/such/file.txt";

    assert_eq!(storage.size(name).await.unwrap(), 0);
    assert_eq!(storage.url(name).await.unwrap(), None);
    assert_eq!(storage.created_time(name).await.unwrap(), None);
    assert_eq!(storage.modified_time(name).await.unwrap(), None);
    assert_eq!(storage.accessed_time(name).await.unwrap(), None);
}

#[tokio::test]
async fn test_metadata_of_saved_file() {
    let (_, storage) = setup();
    let name = storage
        .save("photos/cat.png", Bytes::from(vec![0u8; 2048]))
        .await
        .unwrap();

    assert_eq!(storage.size(&name).await.unwrap(), 2048);
    assert!(storage.url(&name).await.unwrap().is_some());

    let created = storage.created_time(&name).await.unwrap();
    let modified = storage.modified_time(&name).await.unwrap();
    assert!(created.is_some());
    assert!(modified.is_some());
    assert_eq!(storage.accessed_time(&name).await.unwrap(), modified);
}

#[tokio::test]
async fn test_listdir_root() {
    let (transport, storage) = setup();
    transport.insert_file("file1", None, b"1");
    transport.insert_file("file2", None, b"2");
    transport.insert_folder("folder1", None);

    transport.clear_calls();
    let Listing { directories, files } = storage.listdir("/").await.unwrap();

    assert_eq!(as_set(&directories), HashSet::from(["/folder1"]));
    assert_eq!(as_set(&files), HashSet::from(["/file1", "/file2"]));
    // The root needs no lookup: one query for files, one for folders
    assert_eq!(transport.calls(), vec![RemoteCall::Query, RemoteCall::Query]);
}

#[tokio::test]
async fn test_listdir_nested() {
    let (_, storage) = setup();
    storage.save("/a/one.txt", Bytes::from_static(b"1")).await.unwrap();
    storage.save("/a/b/two.txt", Bytes::from_static(b"2")).await.unwrap();

    let listing = storage.listdir("/a").await.unwrap();
    assert_eq!(listing.directories, vec!["/a/b"]);
    assert_eq!(listing.files, vec!["/a/one.txt"]);

    let listing = storage.listdir("/a/b/").await.unwrap();
    assert!(listing.directories.is_empty());
    assert_eq!(listing.files, vec!["/a/b/two.txt"]);
}

#[tokio::test]
async fn test_listdir_missing_or_empty_folder() {
    let (transport, storage) = setup();
    transport.insert_folder("empty", None);

    assert_eq!(storage.listdir("/empty").await.unwrap(), Listing::default());
    assert_eq!(storage.listdir("/missing").await.unwrap(), Listing::default());
}

#[tokio::test]
async fn test_repeated_saves_share_folders() {
    let (transport, storage) = setup();
    storage.save("x/y/a.txt", Bytes::from_static(b"a")).await.unwrap();
    storage.save("x/y/b.txt", Bytes::from_static(b"b")).await.unwrap();

    assert_eq!(transport.folders_named("x").len(), 1);
    assert_eq!(transport.folders_named("y").len(), 1);

    let first = storage.tree().ensure_folder("x/y", None).await.unwrap();
    let second = storage.tree().ensure_folder("x/y", None).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.mime_type.as_deref(), Some(FOLDER_MIME_TYPE));
}

#[tokio::test]
async fn test_root_prefix_applies_to_save_only() {
    let (transport, storage) = setup_with(
        MemoryTransport::new(),
        StorageOptions {
            root_prefix: Some("media".to_string()),
            permissions: PermissionSet::default(),
        },
    );

    let name = storage
        .save("avatars/me.jpg", Bytes::from_static(b"jpg"))
        .await
        .unwrap();
    assert_eq!(name, "media/avatars/me.jpg");
    assert_eq!(transport.folders_named("media").len(), 1);

    assert!(storage.exists(&name).await.unwrap());

    // Listings take the caller's path as given
    let root = storage.listdir("/").await.unwrap();
    assert_eq!(root.directories, vec!["/media"]);
    let prefixed = storage.listdir("media/avatars").await.unwrap();
    assert_eq!(prefixed.files, vec!["media/avatars/me.jpg"]);
}

#[tokio::test]
async fn test_saved_name_falls_back_to_requested_name() {
    let (_, storage) = setup_with(
        MemoryTransport::without_original_filename(),
        StorageOptions::default(),
    );
    let name = storage
        .save("/inbox/letter.txt", Bytes::from_static(b"dear"))
        .await
        .unwrap();
    assert_eq!(name, "/inbox/letter.txt");
    assert!(storage.exists(&name).await.unwrap());
}

#[tokio::test]
async fn test_lookup_tolerates_renamed_upload() {
    let (transport, storage) = setup();
    let folder = transport.insert_folder("uploads", None);
    transport.insert_file("invoice (1).pdf", Some(folder.as_str()), b"%PDF");

    assert!(storage.exists("/uploads/invoice").await.unwrap());
    let file = storage.open("/uploads/invoice").await.unwrap();
    assert_eq!(&file.content[..], b"%PDF");
}

#[tokio::test]
async fn test_save_applies_default_public_grant() {
    let (transport, storage) = setup();
    storage.save("pub.txt", Bytes::from_static(b"x")).await.unwrap();

    let file = &transport.objects()[0];
    let grants = transport.permissions_of(file.id.as_deref().unwrap());
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role.as_deref(), Some("reader"));
    assert_eq!(grants[0].type_.as_deref(), Some("anyone"));
}

/// Invalid grants fail while building the configuration, before any storage exists
#[tokio::test]
async fn test_invalid_role_fails_before_remote_calls() {
    let transport = MemoryTransport::new();

    let result = PermissionSet::from_raw(vec![RawPermission {
        role: "invalid".to_string(),
        principal_type: "anyone".to_string(),
        value: None,
    }]);
    assert!(result.is_err());

    let yaml = "storage:\n  key_file: k.json\n  permissions:\n    - role: invalid\n      type: anyone\n";
    assert!(Config::from_str(yaml).is_err());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_not_absence() {
    let (transport, storage) = setup();
    storage.save("a.txt", Bytes::from_static(b"a")).await.unwrap();
    transport.set_offline(true);

    assert!(matches!(
        storage.exists("a.txt").await,
        Err(StorageError::Transport(_))
    ));
    assert!(storage.size("a.txt").await.is_err());
    assert!(storage.listdir("/").await.is_err());
    assert!(storage.save("b.txt", Bytes::from_static(b"b")).await.is_err());
}

#[tokio::test]
async fn test_storage_as_trait_object() {
    let (_, storage) = setup();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    let name = storage
        .save("/shared/notes.txt", Bytes::from_static(b"notes"))
        .await
        .unwrap();
    let other = storage.clone();
    let handle = tokio::spawn(async move { other.open(&name).await });
    let file = handle.await.unwrap().unwrap();
    assert_eq!(&file.content[..], b"notes");
}
