//! Sync pairs and entry classification
//!
//! A [`SyncPair`] couples a source directory with the replica directory
//! that must mirror it. Pairs are created per recursion level and never
//! persisted.

use std::ffi::OsStr;
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use super::errors::DomainError;

// ============================================================================
// SyncPair
// ============================================================================

/// A `(source_dir, replica_dir)` pairing reconciled at one level
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncPair {
    source_dir: PathBuf,
    replica_dir: PathBuf,
}

impl SyncPair {
    /// Creates a new pair without validation
    pub fn new(source_dir: impl Into<PathBuf>, replica_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            replica_dir: replica_dir.into(),
        }
    }

    /// Creates the root pair of a mirror, rejecting unusable combinations
    ///
    /// Both paths must be non-empty and neither tree may contain the other:
    /// a replica nested inside its source would be copied into itself on
    /// every pass.
    pub fn root(
        source_dir: impl Into<PathBuf>,
        replica_dir: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        let pair = Self::new(source_dir, replica_dir);

        if pair.source_dir.as_os_str().is_empty() {
            return Err(DomainError::InvalidPath("source path is empty".into()));
        }
        if pair.replica_dir.as_os_str().is_empty() {
            return Err(DomainError::InvalidPath("replica path is empty".into()));
        }

        let source = normalize(&pair.source_dir);
        let replica = normalize(&pair.replica_dir);
        if source.starts_with(&replica) || replica.starts_with(&source) {
            return Err(DomainError::OverlappingTrees {
                source_dir: pair.source_dir.display().to_string(),
                replica_dir: pair.replica_dir.display().to_string(),
            });
        }

        Ok(pair)
    }

    /// The source side of the pair
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// The replica side of the pair
    pub fn replica_dir(&self) -> &Path {
        &self.replica_dir
    }

    /// Joins `name` onto both sides
    pub fn child(&self, name: &OsStr) -> Self {
        Self {
            source_dir: self.source_dir.join(name),
            replica_dir: self.replica_dir.join(name),
        }
    }

    /// Source path of the entry `name` at this level
    pub fn source_entry(&self, name: &OsStr) -> PathBuf {
        self.source_dir.join(name)
    }

    /// Replica path of the entry `name` at this level
    pub fn replica_entry(&self, name: &OsStr) -> PathBuf {
        self.replica_dir.join(name)
    }
}

impl fmt::Display for SyncPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.source_dir.display(),
            self.replica_dir.display()
        )
    }
}

/// Lexically normalizes a path for the overlap check.
///
/// Relative paths are anchored at the current directory when it is known;
/// `.` components are dropped and `..` pops the previous component.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let anchored = if path.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    };

    let mut out = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// EntryKind
// ============================================================================

/// Kind of a directory entry as reported by a link-following lookup
///
/// A symbolic link takes the kind of its target; a dangling link or a
/// special file (socket, fifo, device) is [`EntryKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file
    File,
    /// A directory
    Directory,
    /// Anything else, including dangling links
    Other,
}

impl EntryKind {
    /// Classifies link-following metadata
    pub fn from_metadata(metadata: &Metadata) -> Self {
        if metadata.is_dir() {
            EntryKind::Directory
        } else if metadata.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    /// Returns true for [`EntryKind::Directory`]
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Other => "other",
        };
        write!(f, "{}", s)
    }
}
