//! SQLite storage for file records.
//!
//! This module manages its own SQLite connection pool. One row per
//! `(bucket, path)` holds the file bytes alongside their metadata; the
//! schema has no notion of directories, which are synthesized at listing
//! time from the path strings.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::record::{FileAttributes, FileRecord, Visibility};

/// Database connection pool for file records.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl std::ops::Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

/// Errors that can occur when setting up the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl Database {
    /// Create a new database connection with a file-based SQLite database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Migrations are run automatically.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Migration(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!("File store database initialized at {:?}", path);
        Ok(db)
    }

    /// Create a new in-memory database. Useful for testing or ephemeral
    /// stores.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!("File store database initialized in-memory");
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                bucket TEXT NOT NULL,
                path TEXT NOT NULL,
                contents BLOB NOT NULL,
                mime_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                visibility TEXT NOT NULL,
                last_modified INTEGER NOT NULL,
                checksum TEXT NOT NULL,
                PRIMARY KEY (bucket, path)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace the record for `(record.bucket, record.path)`.
    /// Contents, size, checksum and metadata land in a single statement.
    pub async fn upsert_record(&self, record: &FileRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO files (
                bucket, path, contents, mime_type, size,
                visibility, last_modified, checksum
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.bucket)
        .bind(&record.path)
        .bind(&record.contents)
        .bind(&record.mime_type)
        .bind(record.size)
        .bind(record.visibility.as_str())
        .bind(record.last_modified.unix_timestamp())
        .bind(&record.checksum)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the full record, contents included.
    pub async fn get_record(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT bucket, path, contents, mime_type, size,
                   visibility, last_modified, checksum
            FROM files
            WHERE bucket = ?1 AND path = ?2
            "#,
        )
        .bind(bucket)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_record(&r)))
    }

    /// Fetch metadata only, skipping the contents blob.
    pub async fn get_attributes(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<Option<FileAttributes>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT path, mime_type, size, visibility, last_modified
            FROM files
            WHERE bucket = ?1 AND path = ?2
            "#,
        )
        .bind(bucket)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_attributes(&r)))
    }

    /// Fetch only the checksum column. Cheap staleness probe for cached
    /// reads: no blob leaves the database.
    pub async fn get_checksum(
        &self,
        bucket: &str,
        path: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT checksum FROM files WHERE bucket = ?1 AND path = ?2
            "#,
        )
        .bind(bucket)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("checksum")))
    }

    /// True iff a record exists at exactly `(bucket, path)`.
    pub async fn record_exists(&self, bucket: &str, path: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM files WHERE bucket = ?1 AND path = ?2
            ) AS present
            "#,
        )
        .bind(bucket)
        .bind(path)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("present") != 0)
    }

    /// True iff at least one record's path starts with `prefix`.
    pub async fn prefix_exists(&self, bucket: &str, prefix: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM files
                WHERE bucket = ?1 AND path LIKE ?2 ESCAPE '\'
            ) AS present
            "#,
        )
        .bind(bucket)
        .bind(prefix_pattern(prefix))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("present") != 0)
    }

    /// List every path starting with `prefix`, in store iteration order.
    pub async fn list_paths(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT path FROM files
            WHERE bucket = ?1 AND path LIKE ?2 ESCAPE '\'
            "#,
        )
        .bind(bucket)
        .bind(prefix_pattern(prefix))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("path")).collect())
    }

    /// Delete the record at `(bucket, path)`. Returns whether a row
    /// existed; deleting an absent record is not an error.
    pub async fn delete_record(&self, bucket: &str, path: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM files WHERE bucket = ?1 AND path = ?2
            "#,
        )
        .bind(bucket)
        .bind(path)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every record whose path starts with `prefix`.
    pub async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM files
            WHERE bucket = ?1 AND path LIKE ?2 ESCAPE '\'
            "#,
        )
        .bind(bucket)
        .bind(prefix_pattern(prefix))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Update only the visibility column. Returns whether a row matched.
    pub async fn update_visibility(
        &self,
        bucket: &str,
        path: &str,
        visibility: Visibility,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE files SET visibility = ?1 WHERE bucket = ?2 AND path = ?3
            "#,
        )
        .bind(visibility.as_str())
        .bind(bucket)
        .bind(path)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every record in `bucket`.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM files WHERE bucket = ?1
            "#,
        )
        .bind(bucket)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Get the number of records in `bucket`.
    pub async fn record_count(&self, bucket: &str) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM files WHERE bucket = ?1
            "#,
        )
        .bind(bucket)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }
}

/// Build a LIKE pattern matching paths starting with the literal
/// `prefix`. Wildcard metacharacters inside the prefix are escaped so a
/// literal `_` or `%` in a path segment never widens the match.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn row_to_record(row: &SqliteRow) -> FileRecord {
    FileRecord {
        bucket: row.get("bucket"),
        path: row.get("path"),
        contents: row.get("contents"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        visibility: row.get::<String, _>("visibility").parse().unwrap(),
        last_modified: OffsetDateTime::from_unix_timestamp(row.get("last_modified"))
            .expect("invalid last_modified timestamp in database"),
        checksum: row.get("checksum"),
    }
}

fn row_to_attributes(row: &SqliteRow) -> FileAttributes {
    FileAttributes {
        path: row.get("path"),
        size: row.get::<i64, _>("size") as u64,
        mime_type: row.get("mime_type"),
        visibility: row.get::<String, _>("visibility").parse().unwrap(),
        last_modified: OffsetDateTime::from_unix_timestamp(row.get("last_modified"))
            .expect("invalid last_modified timestamp in database"),
    }
}
