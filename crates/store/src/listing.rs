//! Synthesizes a hierarchical directory view from flat record paths.
//!
//! The files table has no directory rows; every directory a listing
//! reports is derived from the path strings of the records under the
//! listed prefix. [`DirectoryListing`] holds the per-call state (the
//! prefix, the depth flag, the set of directories already emitted) and
//! consumes one record path at a time, returning the entries that record
//! contributes in emission order.

use std::collections::HashSet;

/// Reserved filename for the zero-byte record that keeps an otherwise
/// empty directory visible in listings. Never emitted as a file entry,
/// never a legal user filename.
pub const DIRECTORY_MARKER: &str = ".__directory_marker__";

/// An entry synthesized from the record stream, before any attribute
/// lookup has happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEntry {
    /// Directory path with surrounding slashes trimmed, e.g. `a/b`.
    Directory(String),
    /// Full record path of a file to emit, e.g. `/a/b/c.txt`.
    File(String),
}

/// Single-pass synthesis state for one listing call.
///
/// Not resumable: restarting a listing means constructing a fresh value
/// and replaying the record stream.
#[derive(Debug)]
pub struct DirectoryListing {
    prefix: String,
    deep: bool,
    seen: HashSet<String>,
}

impl DirectoryListing {
    /// `prefix` must be normalized and carry a trailing `/`.
    pub fn new(prefix: impl Into<String>, deep: bool) -> Self {
        Self {
            prefix: prefix.into(),
            deep,
            seen: HashSet::new(),
        }
    }

    /// Feed one record path; returns the entries it produces.
    ///
    /// Ancestor directories come first, in first-encounter order and
    /// deduplicated by exact string match across the whole call. In
    /// shallow mode only the first path segment below the prefix is
    /// reported. The file itself follows unless the record is a
    /// directory marker or, in shallow mode, not a direct child.
    pub fn push(&mut self, path: &str) -> Vec<PathEntry> {
        let mut entries = Vec::new();
        let Some(sub_path) = path.strip_prefix(&self.prefix) else {
            return entries;
        };

        if let Some(split) = sub_path.rfind('/') {
            let dirname = &sub_path[..split];
            let mut dir_path = String::new();
            for (index, part) in dirname.split('/').enumerate() {
                if !self.deep && index >= 1 {
                    break;
                }
                dir_path.push_str(part);
                dir_path.push('/');
                if self.seen.insert(dir_path.clone()) {
                    let full = format!("{}{}", self.prefix, dir_path);
                    entries.push(PathEntry::Directory(full.trim_matches('/').to_string()));
                }
            }
        }

        // Marker records exist only to make their directory listable;
        // the ancestors emitted above still count.
        if path.ends_with(DIRECTORY_MARKER) {
            return entries;
        }

        if self.deep || !sub_path.contains('/') {
            entries.push(PathEntry::File(path.to_string()));
        }

        entries
    }
}
