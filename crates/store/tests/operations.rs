//! Black-box tests of the full file store operation surface.

use std::time::Duration;

use futures::TryStreamExt;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use time::OffsetDateTime;

use rowfs_store::{
    CacheConfig, Database, Entry, FileStore, FileStoreConfig, LocalCache, StoreError, Visibility,
    WriteOptions,
};

fn cache_config(temp: &TempDir, cleanup_chance: u32, max_age: Duration) -> CacheConfig {
    CacheConfig {
        directory: temp.path().join("cache"),
        prefix: "rowfs-".to_string(),
        max_age,
        cleanup_chance,
    }
}

async fn setup() -> (FileStore, TempDir) {
    let temp = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    let store = FileStore::new(
        db,
        FileStoreConfig {
            bucket: "test".to_string(),
            default_visibility: Visibility::Public,
            cache: cache_config(&temp, 0, Duration::from_secs(3600)),
        },
    );
    (store, temp)
}

async fn collect(store: &FileStore, path: &str, deep: bool) -> Vec<Entry> {
    store
        .list_contents(path, deep)
        .try_collect::<Vec<_>>()
        .await
        .unwrap()
}

fn dir_paths(entries: &[Entry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| e.is_dir())
        .map(|e| e.path())
        .collect()
}

fn file_paths(entries: &[Entry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| !e.is_dir())
        .map(|e| e.path())
        .collect()
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[tokio::test]
async fn test_write_read_round_trip() {
    let (store, _temp) = setup().await;

    store
        .write("/docs/readme.txt", b"hello", WriteOptions::default())
        .await
        .unwrap();

    assert!(store.file_exists("/docs/readme.txt").await.unwrap());
    assert_eq!(
        store.read("/docs/readme.txt").await.unwrap().as_ref(),
        b"hello"
    );
}

#[tokio::test]
async fn test_read_missing_file() {
    let (store, _temp) = setup().await;

    assert!(matches!(
        store.read("/missing.txt").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_stored_size_and_checksum_invariants() {
    let (store, _temp) = setup().await;

    store
        .write("/data.bin", b"some bytes", WriteOptions::default())
        .await
        .unwrap();

    let record = store
        .database()
        .get_record("test", "/data.bin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.size as usize, record.contents.len());
    assert_eq!(record.checksum, sha256_hex(&record.contents));

    // Overwriting recomputes both.
    store
        .write("/data.bin", b"different", WriteOptions::default())
        .await
        .unwrap();
    let record = store
        .database()
        .get_record("test", "/data.bin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.size, 9);
    assert_eq!(record.checksum, sha256_hex(b"different"));
}

#[tokio::test]
async fn test_paths_are_normalized_consistently() {
    let (store, _temp) = setup().await;

    store
        .write("docs/a.txt", b"x", WriteOptions::default())
        .await
        .unwrap();

    assert!(store.file_exists("/docs/a.txt").await.unwrap());
    assert_eq!(store.read("//docs/a.txt").await.unwrap().as_ref(), b"x");
}

#[tokio::test]
async fn test_listing_docs_scenario() {
    let (store, _temp) = setup().await;

    store
        .write("/docs/readme.txt", b"hello", WriteOptions::default())
        .await
        .unwrap();

    // Shallow root listing: readme.txt is one level down, so only the
    // directory shows.
    let root = collect(&store, "/", false).await;
    assert_eq!(dir_paths(&root), vec!["docs"]);
    assert!(file_paths(&root).is_empty());

    // Listing the directory itself yields the file alone.
    let docs = collect(&store, "/docs", false).await;
    assert!(dir_paths(&docs).is_empty());
    assert_eq!(file_paths(&docs), vec!["/docs/readme.txt"]);
}

#[tokio::test]
async fn test_listing_deep_emits_each_directory_once() {
    let (store, _temp) = setup().await;

    store
        .write("/a/b/c.txt", b"1", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/a/d.txt", b"2", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/a/b/e.txt", b"3", WriteOptions::default())
        .await
        .unwrap();

    let entries = collect(&store, "/a", true).await;
    assert_eq!(dir_paths(&entries), vec!["a/b"]);
    let mut files = file_paths(&entries);
    files.sort_unstable();
    assert_eq!(files, vec!["/a/b/c.txt", "/a/b/e.txt", "/a/d.txt"]);
}

#[tokio::test]
async fn test_listing_shallow_hides_deep_files() {
    let (store, _temp) = setup().await;

    store
        .write("/a/b/c.txt", b"1", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/a/d.txt", b"2", WriteOptions::default())
        .await
        .unwrap();

    let entries = collect(&store, "/a", false).await;
    assert_eq!(dir_paths(&entries), vec!["a/b"]);
    assert_eq!(file_paths(&entries), vec!["/a/d.txt"]);
}

#[tokio::test]
async fn test_listing_unmatched_prefix_is_empty() {
    let (store, _temp) = setup().await;

    store
        .write("/a/b.txt", b"x", WriteOptions::default())
        .await
        .unwrap();

    assert!(collect(&store, "/nope", true).await.is_empty());
}

#[tokio::test]
async fn test_marker_only_directory_lists_as_empty_directory() {
    let (store, _temp) = setup().await;

    store
        .create_directory("/empty", WriteOptions::default())
        .await
        .unwrap();

    let root = collect(&store, "/", false).await;
    assert_eq!(dir_paths(&root), vec!["empty"]);
    assert!(file_paths(&root).is_empty());

    // The directory itself contains zero listed files.
    let inside = collect(&store, "/empty", true).await;
    assert!(file_paths(&inside).is_empty());

    assert!(store.directory_exists("/empty").await.unwrap());
}

#[tokio::test]
async fn test_directory_exists_without_own_record() {
    let (store, _temp) = setup().await;

    store
        .write("/x/y.txt", b"x", WriteOptions::default())
        .await
        .unwrap();

    assert!(store.directory_exists("/x").await.unwrap());
    assert!(!store.directory_exists("/nope").await.unwrap());
    // A file is not a directory.
    assert!(!store.directory_exists("/x/y.txt").await.unwrap());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (store, _temp) = setup().await;

    store
        .write("/a.txt", b"x", WriteOptions::default())
        .await
        .unwrap();
    store.delete("/a.txt").await.unwrap();
    // Deleting again is a no-op, not an error.
    store.delete("/a.txt").await.unwrap();
    assert!(!store.file_exists("/a.txt").await.unwrap());
}

#[tokio::test]
async fn test_delete_directory_removes_subtree_and_marker() {
    let (store, _temp) = setup().await;

    store
        .create_directory("/d", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/d/f.txt", b"x", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/d/sub/g.txt", b"y", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/keep.txt", b"z", WriteOptions::default())
        .await
        .unwrap();

    store.delete_directory("/d").await.unwrap();

    assert!(!store.directory_exists("/d").await.unwrap());
    assert!(!store.file_exists("/d/f.txt").await.unwrap());
    assert!(!store.file_exists("/d/sub/g.txt").await.unwrap());
    assert!(store.file_exists("/keep.txt").await.unwrap());

    // Deleting a directory that no longer exists is a no-op.
    store.delete_directory("/d").await.unwrap();
}

#[tokio::test]
async fn test_visibility_default_override_and_update() {
    let (store, _temp) = setup().await;

    store
        .write("/public.txt", b"x", WriteOptions::default())
        .await
        .unwrap();
    assert_eq!(
        store.visibility("/public.txt").await.unwrap(),
        Visibility::Public
    );

    store
        .write(
            "/private.txt",
            b"x",
            WriteOptions {
                visibility: Some(Visibility::Private),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        store.visibility("/private.txt").await.unwrap(),
        Visibility::Private
    );

    store
        .set_visibility("/private.txt", Visibility::Public)
        .await
        .unwrap();
    assert_eq!(
        store.visibility("/private.txt").await.unwrap(),
        Visibility::Public
    );

    assert!(matches!(
        store.set_visibility("/missing.txt", Visibility::Public).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_metadata_getters() {
    let (store, _temp) = setup().await;

    let timestamp = OffsetDateTime::from_unix_timestamp(1_600_000_000).unwrap();
    store
        .write(
            "/docs/readme.txt",
            b"hello",
            WriteOptions {
                timestamp: Some(timestamp),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(store.file_size("/docs/readme.txt").await.unwrap(), 5);
    assert_eq!(
        store.mime_type("/docs/readme.txt").await.unwrap(),
        "text/plain"
    );
    assert_eq!(
        store.last_modified("/docs/readme.txt").await.unwrap(),
        timestamp
    );
}

#[tokio::test]
async fn test_metadata_failures_are_uniform() {
    let (store, _temp) = setup().await;

    // Missing record: every getter signals the same way.
    assert!(matches!(
        store.file_size("/missing").await,
        Err(StoreError::Metadata { .. })
    ));
    assert!(matches!(
        store.visibility("/missing").await,
        Err(StoreError::Metadata { .. })
    ));
    assert!(matches!(
        store.last_modified("/missing").await,
        Err(StoreError::Metadata { .. })
    ));
    assert!(matches!(
        store.mime_type("/missing").await,
        Err(StoreError::Metadata { .. })
    ));

    // A record with no detectable mime type fails only the mime getter.
    store
        .write("/no-extension", b"x", WriteOptions::default())
        .await
        .unwrap();
    assert!(matches!(
        store.mime_type("/no-extension").await,
        Err(StoreError::Metadata { .. })
    ));
    assert_eq!(store.file_size("/no-extension").await.unwrap(), 1);
}

#[tokio::test]
async fn test_move_conflicts() {
    let (store, _temp) = setup().await;

    store
        .write("/b.txt", b"dest", WriteOptions::default())
        .await
        .unwrap();

    // Missing source.
    assert!(matches!(
        store.move_file("/a.txt", "/c.txt", WriteOptions::default()).await,
        Err(StoreError::MoveConflict { .. })
    ));

    // Existing destination.
    store
        .write("/a.txt", b"src", WriteOptions::default())
        .await
        .unwrap();
    assert!(matches!(
        store.move_file("/a.txt", "/b.txt", WriteOptions::default()).await,
        Err(StoreError::MoveConflict { .. })
    ));

    // A failed precondition leaves everything untouched.
    assert_eq!(store.read("/a.txt").await.unwrap().as_ref(), b"src");
    assert_eq!(store.read("/b.txt").await.unwrap().as_ref(), b"dest");
}

#[tokio::test]
async fn test_move_success() {
    let (store, _temp) = setup().await;

    store
        .write("/a.txt", b"payload", WriteOptions::default())
        .await
        .unwrap();
    store
        .move_file("/a.txt", "/b.txt", WriteOptions::default())
        .await
        .unwrap();

    assert!(!store.file_exists("/a.txt").await.unwrap());
    assert_eq!(store.read("/b.txt").await.unwrap().as_ref(), b"payload");
}

#[tokio::test]
async fn test_copy() {
    let (store, _temp) = setup().await;

    assert!(matches!(
        store.copy_file("/a.txt", "/b.txt", WriteOptions::default()).await,
        Err(StoreError::CopyConflict { .. })
    ));

    store
        .write("/a.txt", b"payload", WriteOptions::default())
        .await
        .unwrap();
    store
        .copy_file("/a.txt", "/b.txt", WriteOptions::default())
        .await
        .unwrap();

    assert_eq!(store.read("/a.txt").await.unwrap().as_ref(), b"payload");
    assert_eq!(store.read("/b.txt").await.unwrap().as_ref(), b"payload");
}

#[tokio::test]
async fn test_stale_cache_loses_to_authoritative_store() {
    let (store, temp) = setup().await;

    store
        .write("/p.txt", b"current", WriteOptions::default())
        .await
        .unwrap();

    // Plant stale bytes in the cache behind the store's back, as another
    // process updating the row would leave them.
    let cache = LocalCache::new(cache_config(&temp, 0, Duration::from_secs(3600)));
    cache.write("test", "/p.txt", b"stale").await;

    // The checksum comparison must reject the cache and serve the row.
    assert_eq!(store.read("/p.txt").await.unwrap().as_ref(), b"current");
    // And the cache is repopulated with the authoritative bytes.
    assert_eq!(cache.read("test", "/p.txt").await.unwrap(), b"current");
}

#[tokio::test]
async fn test_read_survives_cache_corruption_of_missing_record() {
    let (store, temp) = setup().await;

    // A cache entry with no backing record must not resurrect the file.
    let cache = LocalCache::new(cache_config(&temp, 0, Duration::from_secs(3600)));
    cache.write("test", "/ghost.txt", b"boo").await;

    assert!(matches!(
        store.read("/ghost.txt").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_expired_cache_entries_are_swept_on_read() {
    let temp = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    let store = FileStore::new(
        db,
        FileStoreConfig {
            bucket: "test".to_string(),
            default_visibility: Visibility::Public,
            // Certain sweep, immediate expiry.
            cache: cache_config(&temp, 1, Duration::ZERO),
        },
    );

    store
        .write("/a.txt", b"x", WriteOptions::default())
        .await
        .unwrap();

    // Plant an orphaned, prefixed entry that only the sweep can remove.
    let orphan = temp.path().join("cache").join("rowfs-0000deadbeef");
    tokio::fs::write(&orphan, b"expired").await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.read("/a.txt").await.unwrap().as_ref(), b"x");

    assert!(!orphan.exists());
}

#[tokio::test]
async fn test_prefix_operations_treat_wildcards_literally() {
    let (store, _temp) = setup().await;

    store
        .write("/a_c/f.txt", b"1", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/abc/f.txt", b"2", WriteOptions::default())
        .await
        .unwrap();
    store
        .write("/100x/y.txt", b"3", WriteOptions::default())
        .await
        .unwrap();

    // `_` must not act as a single-character wildcard.
    let entries = collect(&store, "/a_c", true).await;
    assert_eq!(file_paths(&entries), vec!["/a_c/f.txt"]);

    // `%` must not act as an any-length wildcard.
    assert!(!store.directory_exists("/100%").await.unwrap());
    assert!(store.directory_exists("/100x").await.unwrap());

    store.delete_directory("/a_c").await.unwrap();
    assert!(store.file_exists("/abc/f.txt").await.unwrap());
}

#[tokio::test]
async fn test_delete_everything_is_scoped_to_the_bucket() {
    let temp = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();

    let first = FileStore::new(
        db.clone(),
        FileStoreConfig {
            bucket: "first".to_string(),
            default_visibility: Visibility::Public,
            cache: cache_config(&temp, 0, Duration::from_secs(3600)),
        },
    );
    let second = FileStore::new(
        db,
        FileStoreConfig {
            bucket: "second".to_string(),
            default_visibility: Visibility::Public,
            cache: cache_config(&temp, 0, Duration::from_secs(3600)),
        },
    );

    first
        .write("/a.txt", b"1", WriteOptions::default())
        .await
        .unwrap();
    second
        .write("/a.txt", b"2", WriteOptions::default())
        .await
        .unwrap();

    first.delete_everything().await.unwrap();

    assert!(!first.file_exists("/a.txt").await.unwrap());
    assert_eq!(second.read("/a.txt").await.unwrap().as_ref(), b"2");
}
