//! Error taxonomy for store operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by [`FileStore`](crate::FileStore) operations.
///
/// Store-layer failures pass through the transparent `Database` variant
/// unwrapped. Cache failures never appear here at all; they are logged
/// and swallowed inside the cache layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation requires an existing record and none matches.
    #[error("no file at {path}")]
    NotFound { path: String },

    /// A metadata getter could not produce the requested field. All
    /// underlying causes (missing record, lookup failure, empty mime
    /// type) collapse into this variant.
    #[error("unable to retrieve metadata for {path}")]
    Metadata { path: String },

    /// Move requires the source to exist and the destination to not.
    #[error("unable to move {src} to {destination}")]
    MoveConflict { src: String, destination: String },

    /// Copy requires the source to exist.
    #[error("unable to copy {src} to {destination}")]
    CopyConflict { src: String, destination: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
