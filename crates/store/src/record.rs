//! Data model for stored files and listing entries.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Visibility flag stored on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "public" => Visibility::Public,
            _ => Visibility::Private,
        })
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stored file: the full row in the files table.
///
/// Invariants maintained by every write: `size == contents.len()` and
/// `checksum` is the lowercase hex SHA-256 of `contents`.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub bucket: String,
    pub path: String,
    pub contents: Vec<u8>,
    pub mime_type: String,
    pub size: i64,
    pub visibility: Visibility,
    pub last_modified: OffsetDateTime,
    pub checksum: String,
}

/// Metadata projection of a record, without the contents blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttributes {
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub visibility: Visibility,
    pub last_modified: OffsetDateTime,
}

/// A directory synthesized from record paths during a listing.
/// Never persisted; exists only for the duration of the listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
}

/// One item yielded by a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entry {
    File(FileAttributes),
    Directory(DirectoryEntry),
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::File(attributes) => &attributes.path,
            Entry::Directory(directory) => &directory.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }
}
