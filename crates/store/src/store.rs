//! Filesystem-shaped operations over the record table, with a local
//! read cache kept coherent by checksum comparison.
//!
//! Writes go to the database first (authoritative), then through to the
//! cache. Reads consult the cache optimistically and validate it with a
//! checksum-only query before trusting it; any mismatch or lookup
//! failure falls back to a full fetch that repopulates the cache.
//! Multi-statement sequences (move) are not atomic; atomicity is
//! per-statement, delegated to SQLite.

use async_stream::try_stream;
use bytes::Bytes;
use futures::Stream;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, LocalCache};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::listing::{DirectoryListing, PathEntry, DIRECTORY_MARKER};
use crate::record::{DirectoryEntry, Entry, FileAttributes, FileRecord, Visibility};

/// Configuration for a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Bucket every operation is scoped to.
    pub bucket: String,
    /// Visibility applied to writes that don't specify one.
    pub default_visibility: Visibility,
    /// Local read cache settings.
    pub cache: CacheConfig,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            bucket: "default".to_string(),
            default_visibility: Visibility::Public,
            cache: CacheConfig::default(),
        }
    }
}

/// Per-write overrides. Unset fields fall back to the current time and
/// the store's configured default visibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub timestamp: Option<OffsetDateTime>,
    pub visibility: Option<Visibility>,
}

/// File-system semantics over rows in the files table.
///
/// Every operation runs to completion on the calling task; there is no
/// internal parallelism and no cross-statement transaction. Concurrent
/// writers to the same path race under last-write-wins upserts.
#[derive(Debug, Clone)]
pub struct FileStore {
    db: Database,
    cache: LocalCache,
    bucket: String,
    default_visibility: Visibility,
}

impl FileStore {
    pub fn new(db: Database, config: FileStoreConfig) -> Self {
        Self {
            db,
            cache: LocalCache::new(config.cache),
            bucket: config.bucket,
            default_visibility: config.default_visibility,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Normalize a path to exactly one leading `/`. Everything after it
    /// is preserved verbatim; idempotent.
    pub fn normalize(path: &str) -> String {
        format!("/{}", path.trim_start_matches('/'))
    }

    /// Store `contents` at `path`, replacing any existing record.
    ///
    /// Mime type, size and checksum are recomputed here and land in the
    /// same upsert statement as the contents. The cache is written
    /// through afterwards; a cache failure does not fail the write.
    pub async fn write(&self, path: &str, contents: &[u8], options: WriteOptions) -> Result<()> {
        let path = Self::normalize(path);

        let record = FileRecord {
            bucket: self.bucket.clone(),
            path: path.clone(),
            contents: contents.to_vec(),
            mime_type: detect_mime_type(&path),
            size: contents.len() as i64,
            visibility: options.visibility.unwrap_or(self.default_visibility),
            last_modified: options.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
            checksum: checksum_hex(contents),
        };
        self.db.upsert_record(&record).await?;
        self.cache.write(&self.bucket, &path, contents).await;

        debug!(path = %path, size = contents.len(), "file written");
        Ok(())
    }

    /// Read the contents at `path`.
    ///
    /// Cached bytes are returned only when the checksum-only store query
    /// matches their hash; otherwise the full record is fetched and the
    /// cache repopulated. Each call also gives the cache a chance to run
    /// its probabilistic expiry sweep.
    pub async fn read(&self, path: &str) -> Result<Bytes> {
        let path = Self::normalize(path);
        self.cache.maybe_sweep().await;

        if let Some(cached) = self.cache.read(&self.bucket, &path).await {
            match self.db.get_checksum(&self.bucket, &path).await {
                Ok(Some(checksum)) if checksum == checksum_hex(&cached) => {
                    debug!(path = %path, "cache hit");
                    return Ok(Bytes::from(cached));
                }
                Ok(_) => debug!(path = %path, "cache entry is stale"),
                Err(e) => {
                    warn!(path = %path, error = %e, "checksum lookup failed, fetching full record");
                }
            }
        }

        let record = self
            .db
            .get_record(&self.bucket, &path)
            .await?
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;
        self.cache.write(&self.bucket, &path, &record.contents).await;
        Ok(Bytes::from(record.contents))
    }

    /// Remove the record at `path`. Absent records are a no-op.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let path = Self::normalize(path);
        self.db.delete_record(&self.bucket, &path).await?;
        self.cache.remove(&self.bucket, &path).await;
        Ok(())
    }

    /// Remove every record under `path/`, then the record at `path`
    /// itself (its own marker, if any).
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let path = Self::normalize(path);
        let prefix = format!("{}/", path.trim_end_matches('/'));

        let removed = self.db.delete_prefix(&self.bucket, &prefix).await?;
        self.db
            .delete_record(&self.bucket, prefix.trim_end_matches('/'))
            .await?;

        debug!(path = %path, removed = removed, "directory deleted");
        Ok(())
    }

    /// Write the zero-byte marker record that keeps an otherwise empty
    /// directory visible in listings.
    pub async fn create_directory(&self, path: &str, options: WriteOptions) -> Result<()> {
        let path = Self::normalize(path);
        let marker_path = format!("{}/{}", path.trim_end_matches('/'), DIRECTORY_MARKER);
        self.write(&marker_path, b"", options).await
    }

    /// True iff at least one record's path has `path/` as a prefix,
    /// whether or not `path` itself has a record.
    pub async fn directory_exists(&self, path: &str) -> Result<bool> {
        let path = Self::normalize(path);
        let prefix = format!("{}/", path.trim_end_matches('/'));
        Ok(self.db.prefix_exists(&self.bucket, &prefix).await?)
    }

    /// True iff a record exists at exactly `path`.
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        let path = Self::normalize(path);
        Ok(self.db.record_exists(&self.bucket, &path).await?)
    }

    /// Update the visibility column of an existing record.
    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let path = Self::normalize(path);
        let updated = self
            .db
            .update_visibility(&self.bucket, &path, visibility)
            .await?;
        if !updated {
            return Err(StoreError::NotFound { path });
        }
        Ok(())
    }

    pub async fn visibility(&self, path: &str) -> Result<Visibility> {
        Ok(self.metadata(path).await?.visibility)
    }

    /// The stored mime type. Fails like any metadata getter when the
    /// record is missing, and also when the stored type is empty.
    pub async fn mime_type(&self, path: &str) -> Result<String> {
        let attributes = self.metadata(path).await?;
        if attributes.mime_type.is_empty() {
            return Err(StoreError::Metadata {
                path: attributes.path,
            });
        }
        Ok(attributes.mime_type)
    }

    pub async fn last_modified(&self, path: &str) -> Result<OffsetDateTime> {
        Ok(self.metadata(path).await?.last_modified)
    }

    pub async fn file_size(&self, path: &str) -> Result<u64> {
        Ok(self.metadata(path).await?.size)
    }

    /// Move a record. The source must exist and the destination must
    /// not; violation of either fails before anything changes. The
    /// read/write/delete sequence afterwards is best-effort: a failure
    /// between the write and the delete leaves both copies behind.
    pub async fn move_file(
        &self,
        source: &str,
        destination: &str,
        options: WriteOptions,
    ) -> Result<()> {
        let source = Self::normalize(source);
        let destination = Self::normalize(destination);

        if !self.db.record_exists(&self.bucket, &source).await?
            || self.db.record_exists(&self.bucket, &destination).await?
        {
            return Err(StoreError::MoveConflict {
                src: source,
                destination,
            });
        }

        let contents = self.read(&source).await?;
        self.write(&destination, &contents, options).await?;
        self.delete(&source).await?;
        Ok(())
    }

    /// Copy a record's contents to a new path. The destination gets a
    /// fresh timestamp and checksum; an existing destination is
    /// overwritten.
    pub async fn copy_file(
        &self,
        source: &str,
        destination: &str,
        options: WriteOptions,
    ) -> Result<()> {
        let source = Self::normalize(source);
        let destination = Self::normalize(destination);

        if !self.db.record_exists(&self.bucket, &source).await? {
            return Err(StoreError::CopyConflict {
                src: source,
                destination,
            });
        }

        let contents = self.read(&source).await?;
        self.write(&destination, &contents, options).await?;
        Ok(())
    }

    /// List the entries under `path` as a lazy, single-pass stream of
    /// synthesized directories and file attributes.
    ///
    /// Directories appear in first-encounter order across the record
    /// stream and may interleave with files; each directory is emitted
    /// exactly once per call. Shallow listings report only direct
    /// children and first-level subdirectories. Not resumable; restart
    /// by calling again.
    pub fn list_contents<'a>(
        &'a self,
        path: &str,
        deep: bool,
    ) -> impl Stream<Item = Result<Entry>> + 'a {
        let prefix = format!("{}/", Self::normalize(path).trim_end_matches('/'));

        try_stream! {
            let paths = self.db.list_paths(&self.bucket, &prefix).await?;
            let mut listing = DirectoryListing::new(prefix.as_str(), deep);

            for record_path in paths {
                for entry in listing.push(&record_path) {
                    match entry {
                        PathEntry::Directory(dir) => {
                            yield Entry::Directory(DirectoryEntry { path: dir });
                        }
                        PathEntry::File(file_path) => {
                            let attributes = self
                                .db
                                .get_attributes(&self.bucket, &file_path)
                                .await?
                                .ok_or_else(|| StoreError::NotFound {
                                    path: file_path.clone(),
                                })?;
                            yield Entry::File(attributes);
                        }
                    }
                }
            }
        }
    }

    /// Remove every record in this store's bucket. Cache entries are
    /// left to the per-read checksum comparison and the expiry sweep.
    pub async fn delete_everything(&self) -> Result<()> {
        let removed = self.db.delete_bucket(&self.bucket).await?;
        debug!(bucket = %self.bucket, removed = removed, "bucket cleared");
        Ok(())
    }

    /// Metadata lookup backing the getters. Every underlying failure,
    /// missing record included, re-signals uniformly.
    async fn metadata(&self, path: &str) -> Result<FileAttributes> {
        let path = Self::normalize(path);
        match self.db.get_attributes(&self.bucket, &path).await {
            Ok(Some(attributes)) => Ok(attributes),
            Ok(None) | Err(_) => Err(StoreError::Metadata { path }),
        }
    }
}

fn checksum_hex(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    hex::encode(hasher.finalize())
}

/// Detect a mime type from the path, with an empty-string fallback when
/// nothing matches.
fn detect_mime_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.to_string())
        .unwrap_or_default()
}
