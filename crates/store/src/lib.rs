//! Filesystem semantics over rows in a SQLite table.
//!
//! Files live as one row per `(bucket, path)` with their bytes, a
//! SHA-256 checksum and metadata columns. The store synthesizes a
//! hierarchical directory view from the flat path strings at listing
//! time, and keeps a local disk cache of file contents that is validated
//! against the authoritative table with a cheap checksum-only query on
//! every read. Cache expiry is amortized over read traffic; there are no
//! background tasks.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfs_store::{Database, FileStore, FileStoreConfig, WriteOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("/tmp/rowfs/files.db").await?;
//! let store = FileStore::new(db, FileStoreConfig::default());
//!
//! store
//!     .write("/docs/readme.txt", b"hello", WriteOptions::default())
//!     .await?;
//!
//! let contents = store.read("/docs/readme.txt").await?;
//! assert_eq!(contents.as_ref(), b"hello");
//! # Ok(())
//! # }
//! ```

mod cache;
mod database;
mod error;
mod listing;
mod record;
mod store;

pub use cache::{CacheConfig, LocalCache};
pub use database::{Database, DatabaseError};
pub use error::{Result, StoreError};
pub use listing::{DirectoryListing, PathEntry, DIRECTORY_MARKER};
pub use record::{DirectoryEntry, Entry, FileAttributes, FileRecord, Visibility};
pub use store::{FileStore, FileStoreConfig, WriteOptions};
