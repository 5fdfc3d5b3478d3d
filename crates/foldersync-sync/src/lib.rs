//! FolderSync Sync - One-way tree mirroring engine
//!
//! Provides:
//! - Byte-exact mirroring of a source tree into a replica tree
//! - Per-action outcomes aggregated into a pass report
//! - Periodic, non-overlapping passes with cooperative shutdown
//!
//! ## Modules
//!
//! - [`comparator`] - One-level listing diff of a sync pair
//! - [`content`] - Byte-for-byte file comparison
//! - [`filesystem`] - Metadata-preserving copy helpers
//! - [`executor`] - Applies single actions to the replica
//! - [`engine`] - Worklist-driven reconciliation of a whole tree
//! - [`scheduler`] - Replica bootstrap and the interval loop
//! - [`sink`] - `tracing`-backed and in-memory event sinks

pub mod comparator;
pub mod content;
pub mod engine;
pub mod executor;
pub mod filesystem;
pub mod scheduler;
pub mod sink;

use std::path::{Path, PathBuf};

use foldersync_core::domain::FailureStage;
use thiserror::Error;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// A directory could not be enumerated or an entry could not be inspected
    #[error("Cannot list {path}: {source}")]
    ListingFailure {
        /// The directory or entry being inspected
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File bytes could not be read for comparison
    #[error("Cannot compare {source_path} with {replica_path}: {source}")]
    CompareFailure {
        /// File in the source tree
        source_path: PathBuf,
        /// File in the replica tree
        replica_path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A file or subtree could not be copied
    #[error("Cannot copy {from} to {to}: {source}")]
    CopyFailure {
        /// Path being read
        from: PathBuf,
        /// Path being written
        to: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A file or subtree could not be removed
    #[error("Cannot remove {path}: {source}")]
    RemoveFailure {
        /// Path being removed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The source root is missing or not a directory
    #[error("Source root is not a directory: {0}")]
    SourceRootMissing(PathBuf),
}

impl SyncError {
    /// The path most relevant to the failure
    pub fn path(&self) -> &Path {
        match self {
            SyncError::ListingFailure { path, .. } | SyncError::RemoveFailure { path, .. } => path,
            SyncError::CompareFailure { replica_path, .. } => replica_path,
            SyncError::CopyFailure { to, .. } => to,
            SyncError::SourceRootMissing(path) => path,
        }
    }

    /// The pass stage this error belongs to when no action was involved
    pub fn stage(&self) -> FailureStage {
        match self {
            SyncError::CompareFailure { .. } => FailureStage::Compare,
            _ => FailureStage::Listing,
        }
    }
}
