//! Content comparator - byte-exact equality of two regular files
//!
//! "Same" means identical bytes. A size mismatch short-circuits to
//! "different"; otherwise both files are read in fixed-size chunks until the
//! first differing chunk or the end. Nothing is cached between passes.

use std::io::ErrorKind;
use std::path::Path;

use foldersync_core::domain::CompareMode;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::trace;

use crate::SyncError;

/// Chunk size used when streaming both files
const CHUNK_SIZE: usize = 64 * 1024;

// ============================================================================
// ContentComparator
// ============================================================================

/// Decides whether a source file and its replica counterpart are identical
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentComparator {
    mode: CompareMode,
}

impl ContentComparator {
    /// Creates a comparator using `mode`
    #[must_use]
    pub fn new(mode: CompareMode) -> Self {
        Self { mode }
    }

    /// Returns true if `replica` holds the same bytes as `source`
    ///
    /// In [`CompareMode::Quick`], equal size plus equal modification time
    /// is accepted as identical without reading either file.
    ///
    /// # Errors
    /// Returns [`SyncError::CompareFailure`] if either file cannot be read.
    pub async fn same(&self, source: &Path, replica: &Path) -> Result<bool, SyncError> {
        let compare_error = |e| SyncError::CompareFailure {
            source_path: source.to_path_buf(),
            replica_path: replica.to_path_buf(),
            source: e,
        };

        let source_meta = tokio::fs::metadata(source).await.map_err(compare_error)?;
        let replica_meta = tokio::fs::metadata(replica).await.map_err(compare_error)?;

        if source_meta.len() != replica_meta.len() {
            trace!(path = %replica.display(), "size differs");
            return Ok(false);
        }

        if self.mode == CompareMode::Quick {
            if let (Ok(a), Ok(b)) = (source_meta.modified(), replica_meta.modified()) {
                if a == b {
                    trace!(path = %replica.display(), "size and mtime match");
                    return Ok(true);
                }
            }
        }

        contents_equal(source, replica).await.map_err(compare_error)
    }
}

/// Streams both files and compares them chunk by chunk
async fn contents_equal(a: &Path, b: &Path) -> std::io::Result<bool> {
    let mut file_a = File::open(a).await?;
    let mut file_b = File::open(b).await?;
    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let n_a = fill(&mut file_a, &mut buf_a).await?;
        let n_b = fill(&mut file_b, &mut buf_b).await?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Reads until `buf` is full or the file ends; returns the byte count
async fn fill(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
