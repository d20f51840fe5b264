//! Disk-backed read cache keyed by a stable hash of `(bucket, path)`.
//!
//! Every cache operation is best-effort: failures are logged and
//! swallowed so they never fail the store operation that triggered them.
//! Expiry is amortized over ordinary read traffic instead of a
//! background task: each read rolls a configurable 1-in-N chance and, on
//! a hit, sweeps the cache directory for over-age entries.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Configuration for the local read cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding cache entries.
    pub directory: PathBuf,
    /// Filename prefix identifying entries owned by this cache.
    pub prefix: String,
    /// Entries not touched for longer than this are removed by the sweep.
    pub max_age: Duration,
    /// Sweep on roughly 1-in-N read calls; 0 disables sweeping.
    pub cleanup_chance: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: std::env::temp_dir().join("rowfs-cache"),
            prefix: "rowfs-".to_string(),
            max_age: Duration::from_secs(24 * 60 * 60),
            cleanup_chance: 100,
        }
    }
}

/// Local disk cache for file contents.
///
/// Entries are named `<prefix><hex sha256 of (bucket, path)>` so
/// filenames stay bounded and filesystem-safe regardless of the stored
/// path. The cache never validates freshness itself; the store compares
/// checksums against the authoritative table on each read.
#[derive(Debug, Clone)]
pub struct LocalCache {
    config: CacheConfig,
}

impl LocalCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn entry_path(&self, bucket: &str, path: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(bucket.as_bytes());
        hasher.update([0u8]);
        hasher.update(path.as_bytes());
        let key = hex::encode(hasher.finalize());
        self.config
            .directory
            .join(format!("{}{}", self.config.prefix, key))
    }

    /// Return the cached bytes for `(bucket, path)`, if an entry exists.
    pub async fn read(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        let file = self.entry_path(bucket, path);
        match tokio::fs::read(&file).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to read cache entry");
                None
            }
        }
    }

    /// Store `contents` for `(bucket, path)`, overwriting any existing
    /// entry. Failures are logged and swallowed.
    pub async fn write(&self, bucket: &str, path: &str, contents: &[u8]) {
        if let Err(e) = tokio::fs::create_dir_all(&self.config.directory).await {
            warn!(
                directory = %self.config.directory.display(),
                error = %e,
                "failed to create cache directory"
            );
            return;
        }

        let file = self.entry_path(bucket, path);
        if let Err(e) = tokio::fs::write(&file, contents).await {
            warn!(file = %file.display(), error = %e, "failed to write cache entry");
        }
    }

    /// Drop the entry for `(bucket, path)`. Removing an absent entry is
    /// success.
    pub async fn remove(&self, bucket: &str, path: &str) {
        let file = self.entry_path(bucket, path);
        match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(file = %file.display(), error = %e, "failed to remove cache entry");
            }
        }
    }

    /// Roll the configured 1-in-N chance and sweep on a hit. The roll is
    /// independent of whichever path is being read.
    pub async fn maybe_sweep(&self) {
        let chance = self.config.cleanup_chance;
        if chance == 0 {
            return;
        }
        if rand::thread_rng().gen_range(0..chance) != 0 {
            return;
        }
        self.sweep().await;
    }

    /// Remove every entry carrying this cache's filename prefix whose
    /// last access is older than the maximum age. Entries already
    /// removed by a concurrent sweep count as success.
    pub async fn sweep(&self) {
        let mut entries = match tokio::fs::read_dir(&self.config.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                warn!(
                    directory = %self.config.directory.display(),
                    error = %e,
                    "failed to open cache directory for sweep"
                );
                return;
            }
        };

        let mut removed = 0usize;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to iterate cache directory");
                    break;
                }
            };

            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&self.config.prefix) {
                continue;
            }

            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            // Access time where the filesystem tracks it, else mtime.
            let touched = metadata.accessed().or_else(|_| metadata.modified());
            let Ok(touched) = touched else { continue };
            let expired = touched
                .elapsed()
                .map(|age| age > self.config.max_age)
                .unwrap_or(false);
            if !expired {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(
                        file = %entry.path().display(),
                        error = %e,
                        "failed to remove expired cache entry"
                    );
                }
            }
        }

        if removed > 0 {
            debug!(removed = removed, "cache sweep removed expired entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(directory: PathBuf, max_age: Duration, cleanup_chance: u32) -> LocalCache {
        LocalCache::new(CacheConfig {
            directory,
            prefix: "rowfs-".to_string(),
            max_age,
            cleanup_chance,
        })
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::from_secs(60), 0);

        cache.write("b", "/a.txt", b"hello").await;
        assert_eq!(cache.read("b", "/a.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_read_absent_entry() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::from_secs(60), 0);

        assert!(cache.read("b", "/missing.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::from_secs(60), 0);

        cache.write("b", "/a.txt", b"one").await;
        cache.write("b", "/a.txt", b"two").await;
        assert_eq!(cache.read("b", "/a.txt").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_keys_are_scoped_by_bucket() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::from_secs(60), 0);

        cache.write("one", "/a.txt", b"1").await;
        cache.write("two", "/a.txt", b"2").await;
        assert_eq!(cache.read("one", "/a.txt").await.unwrap(), b"1");
        assert_eq!(cache.read("two", "/a.txt").await.unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::from_secs(60), 0);

        cache.write("b", "/a.txt", b"x").await;
        cache.remove("b", "/a.txt").await;
        assert!(cache.read("b", "/a.txt").await.is_none());
        // Removing again is success, not an error.
        cache.remove("b", "/a.txt").await;
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries_only() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::ZERO, 0);

        cache.write("b", "/old.txt", b"old").await;
        // A file without the cache prefix must survive the sweep.
        tokio::fs::write(temp.path().join("unrelated"), b"keep")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.sweep().await;

        assert!(cache.read("b", "/old.txt").await.is_none());
        assert!(temp.path().join("unrelated").exists());
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_entries() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::from_secs(3600), 0);

        cache.write("b", "/fresh.txt", b"fresh").await;
        cache.sweep().await;

        assert_eq!(cache.read("b", "/fresh.txt").await.unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_maybe_sweep_with_certain_chance() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::ZERO, 1);

        cache.write("b", "/old.txt", b"old").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.maybe_sweep().await;

        assert!(cache.read("b", "/old.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_maybe_sweep_disabled() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().to_path_buf(), Duration::ZERO, 0);

        cache.write("b", "/old.txt", b"old").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.maybe_sweep().await;

        assert!(cache.read("b", "/old.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_on_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let cache = test_cache(temp.path().join("never-created"), Duration::ZERO, 0);
        // Nothing to do, nothing to fail.
        cache.sweep().await;
    }
}
