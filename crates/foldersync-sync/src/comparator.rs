//! Tree comparator - one-level set difference of two directory listings
//!
//! [`TreeComparator::diff`] lists the immediate entries of both sides of a
//! [`SyncPair`] and partitions the union of names into three disjoint sets.
//! Names are kept as `OsString` so non-UTF-8 names survive, and each set is
//! sorted so that log output is deterministic.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;

use foldersync_core::domain::{EntryKind, SyncPair};
use tracing::{debug, instrument};

use crate::SyncError;

// ============================================================================
// TreeDiff
// ============================================================================

/// Partition of the entry names found at one level of a sync pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Names present in the source directory only
    pub only_in_source: Vec<OsString>,
    /// Names present in the replica directory only
    pub only_in_replica: Vec<OsString>,
    /// Names present on both sides
    pub in_both: Vec<OsString>,
}

impl TreeDiff {
    /// Partitions two name sets
    pub fn partition(source: &BTreeSet<OsString>, replica: &BTreeSet<OsString>) -> Self {
        Self {
            only_in_source: source.difference(replica).cloned().collect(),
            only_in_replica: replica.difference(source).cloned().collect(),
            in_both: source.intersection(replica).cloned().collect(),
        }
    }
}

// ============================================================================
// TreeComparator
// ============================================================================

/// Lists and partitions the entries of a sync pair
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeComparator;

impl TreeComparator {
    /// Create a new `TreeComparator`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Computes the one-level difference between both sides of `pair`
    ///
    /// Both sides must already be directories.
    ///
    /// # Errors
    /// Returns [`SyncError::ListingFailure`] if either side cannot be read.
    #[instrument(level = "trace", skip_all, fields(pair = %pair))]
    pub async fn diff(&self, pair: &SyncPair) -> Result<TreeDiff, SyncError> {
        let source = list_names(pair.source_dir()).await?;
        let replica = list_names(pair.replica_dir()).await?;
        let diff = TreeDiff::partition(&source, &replica);

        debug!(
            only_in_source = diff.only_in_source.len(),
            only_in_replica = diff.only_in_replica.len(),
            in_both = diff.in_both.len(),
            "listing compared"
        );
        Ok(diff)
    }
}

/// Lists the immediate entry names of `dir`
pub async fn list_names(dir: &Path) -> Result<BTreeSet<OsString>, SyncError> {
    let listing_error = |source| SyncError::ListingFailure {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(listing_error)?;
    let mut names = BTreeSet::new();
    while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
        names.insert(entry.file_name());
    }
    Ok(names)
}

// ============================================================================
// Entry classification
// ============================================================================

/// Classifies a source-side entry, following symbolic links
///
/// A dangling link is reported as [`EntryKind::Other`] rather than an error.
pub async fn classify_source(path: &Path) -> Result<EntryKind, SyncError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(EntryKind::from_metadata(&metadata)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // The name was listed, so a missing target means a dangling link.
            match tokio::fs::symlink_metadata(path).await {
                Ok(_) => Ok(EntryKind::Other),
                Err(source) => Err(SyncError::ListingFailure {
                    path: path.to_path_buf(),
                    source,
                }),
            }
        }
        Err(source) => Err(SyncError::ListingFailure {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Classifies a replica-side entry without following symbolic links
///
/// A link in the replica is [`EntryKind::Other`]; the engine never walks
/// or writes through it, so mutations stay inside the replica tree.
pub async fn classify_replica(path: &Path) -> Result<EntryKind, SyncError> {
    tokio::fs::symlink_metadata(path)
        .await
        .map(|metadata| EntryKind::from_metadata(&metadata))
        .map_err(|source| SyncError::ListingFailure {
            path: path.to_path_buf(),
            source,
        })
}
