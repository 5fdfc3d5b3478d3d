//! Metadata-preserving copy and removal helpers
//!
//! Thin wrappers around `tokio::fs` used by the
//! [`MutationExecutor`](crate::executor::MutationExecutor).
//!
//! ## Design Decisions
//!
//! - **Metadata**: a copy carries the permission bits (via `tokio::fs::copy`)
//!   and the access/modification times (via `filetime`) of its source.
//! - **Subtrees**: copied with an explicit worklist; directory timestamps are
//!   applied after their contents so writing children does not bump them.
//! - **Links**: source links are followed; dangling links and special files
//!   inside a copied subtree are skipped.
//! - **No atomicity**: an interrupted copy can leave a partial file behind.

use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, trace, warn};

use crate::SyncError;

// ============================================================================
// Timestamps
// ============================================================================

/// Copies access and modification times from `metadata` onto `dest`
async fn copy_times(dest: &Path, metadata: &std::fs::Metadata) -> std::io::Result<()> {
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = FileTime::from_last_modification_time(metadata);
    let dest = dest.to_path_buf();

    // filetime is blocking.
    tokio::task::spawn_blocking(move || filetime::set_file_times(&dest, atime, mtime))
        .await
        .map_err(std::io::Error::other)?
}

// ============================================================================
// Files
// ============================================================================

/// Copies one file's bytes, permissions and timestamps from `from` to `to`
///
/// `to` is created or truncated. A read-only `to` is made writable first so
/// that a file copied from a read-only source can still be updated later.
pub async fn copy_file(from: &Path, to: &Path) -> Result<(), SyncError> {
    let copy_error = |source| SyncError::CopyFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if let Ok(existing) = tokio::fs::symlink_metadata(to).await {
        let mut permissions = existing.permissions();
        if existing.is_file() && permissions.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            tokio::fs::set_permissions(to, permissions)
                .await
                .map_err(copy_error)?;
        }
    }

    let metadata = tokio::fs::metadata(from).await.map_err(copy_error)?;
    let bytes = tokio::fs::copy(from, to).await.map_err(copy_error)?;
    copy_times(to, &metadata).await.map_err(copy_error)?;

    trace!(from = %from.display(), to = %to.display(), bytes, "file copied");
    Ok(())
}

// ============================================================================
// Subtrees
// ============================================================================

/// Recursively copies the directory `from` to the not-yet-existing `to`
///
/// # Errors
/// Returns [`SyncError::CopyFailure`] naming the exact entry that failed.
/// An existing `to` is reported as `AlreadyExists` and left untouched.
pub async fn copy_tree(from: &Path, to: &Path) -> Result<u64, SyncError> {
    let fail = |from: &Path, to: &Path, source| SyncError::CopyFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if tokio::fs::symlink_metadata(to).await.is_ok() {
        return Err(fail(
            from,
            to,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination already exists",
            ),
        ));
    }

    tokio::fs::create_dir(to)
        .await
        .map_err(|e| fail(from, to, e))?;

    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(from.to_path_buf(), to.to_path_buf())];
    let mut finished: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut files = 0u64;

    while let Some((src_dir, dst_dir)) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&src_dir)
            .await
            .map_err(|e| fail(&src_dir, &dst_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| fail(&src_dir, &dst_dir, e))?
        {
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());
            let metadata = match tokio::fs::metadata(&src).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %src.display(), "Skipping dangling link");
                    continue;
                }
                Err(e) => return Err(fail(&src, &dst, e)),
            };

            if metadata.is_dir() {
                tokio::fs::create_dir(&dst)
                    .await
                    .map_err(|e| fail(&src, &dst, e))?;
                pending.push((src, dst));
            } else if metadata.is_file() {
                copy_file(&src, &dst).await?;
                files += 1;
            } else {
                warn!(path = %src.display(), "Skipping entry that is neither file nor directory");
            }
        }

        finished.push((src_dir, dst_dir));
    }

    // Deepest directories were finished last; stamp them first.
    for (src_dir, dst_dir) in finished.iter().rev() {
        let metadata = tokio::fs::metadata(src_dir)
            .await
            .map_err(|e| fail(src_dir, dst_dir, e))?;
        tokio::fs::set_permissions(dst_dir, metadata.permissions())
            .await
            .map_err(|e| fail(src_dir, dst_dir, e))?;
        copy_times(dst_dir, &metadata)
            .await
            .map_err(|e| fail(src_dir, dst_dir, e))?;
    }

    debug!(from = %from.display(), to = %to.display(), files, "subtree copied");
    Ok(files)
}

// ============================================================================
// Removal
// ============================================================================

/// Removes a single file (or link, which is never followed)
pub async fn remove_file(path: &Path) -> Result<(), SyncError> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|source| SyncError::RemoveFailure {
            path: path.to_path_buf(),
            source,
        })
}

/// Removes a whole subtree
pub async fn remove_tree(path: &Path) -> Result<(), SyncError> {
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|source| SyncError::RemoveFailure {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use tempfile::TempDir;

    use super::*;

    fn mtime(path: &Path) -> FileTime {
        FileTime::from_last_modification_time(&std::fs::metadata(path).unwrap())
    }

    fn stamp(path: &Path, secs: u64) {
        let t = FileTime::from_system_time(SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
        filetime::set_file_mtime(path, t).unwrap();
    }

    #[tokio::test]
    async fn test_copy_file_preserves_content_and_mtime() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("b.txt");
        std::fs::write(&from, b"payload").unwrap();
        stamp(&from, 1_600_000_000);

        copy_file(&from, &to).await.unwrap();

        assert_eq!(std::fs::read(&to).unwrap(), b"payload");
        assert_eq!(mtime(&to), mtime(&from));
    }

    #[tokio::test]
    async fn test_copy_file_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("b.txt");
        std::fs::write(&from, b"new").unwrap();
        std::fs::write(&to, b"old and longer").unwrap();

        copy_file(&from, &to).await.unwrap();
        assert_eq!(std::fs::read(&to).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_file_preserves_mode_and_updates_readonly_target() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let from = dir.path().join("ro.txt");
        let to = dir.path().join("copy.txt");
        std::fs::write(&from, b"v1").unwrap();
        std::fs::set_permissions(&from, std::fs::Permissions::from_mode(0o444)).unwrap();

        copy_file(&from, &to).await.unwrap();
        let mode = std::fs::metadata(&to).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o444);

        std::fs::set_permissions(&from, std::fs::Permissions::from_mode(0o644)).unwrap();
        std::fs::write(&from, b"v2").unwrap();
        std::fs::set_permissions(&from, std::fs::Permissions::from_mode(0o444)).unwrap();

        copy_file(&from, &to).await.unwrap();
        assert_eq!(std::fs::read(&to).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_copy_file_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = copy_file(&dir.path().join("nope"), &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::CopyFailure { .. }));
    }

    #[tokio::test]
    async fn test_copy_tree_nested() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("a/b")).unwrap();
        std::fs::create_dir_all(src.join("empty")).unwrap();
        std::fs::write(src.join("top.txt"), b"top").unwrap();
        std::fs::write(src.join("a/b/deep.txt"), b"deep").unwrap();
        stamp(&src.join("a"), 1_500_000_000);

        let dst = dir.path().join("dst");
        let files = copy_tree(&src, &dst).await.unwrap();

        assert_eq!(files, 2);
        assert_eq!(std::fs::read(dst.join("top.txt")).unwrap(), b"top");
        assert_eq!(std::fs::read(dst.join("a/b/deep.txt")).unwrap(), b"deep");
        assert!(dst.join("empty").is_dir());
        assert_eq!(mtime(&dst.join("a")), mtime(&src.join("a")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_tree_skips_dangling_links() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("real.txt"), b"r").unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), src.join("broken")).unwrap();

        let dst = dir.path().join("dst");
        let files = copy_tree(&src, &dst).await.unwrap();

        assert_eq!(files, 1);
        assert!(dst.join("real.txt").is_file());
        assert!(std::fs::symlink_metadata(dst.join("broken")).is_err());
    }

    #[tokio::test]
    async fn test_copy_tree_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("f"), b"1").unwrap();
        std::fs::create_dir(&dst).unwrap();

        let err = copy_tree(&src, &dst).await.unwrap_err();
        match err {
            SyncError::CopyFailure { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dst.join("f").exists());
    }

    #[tokio::test]
    async fn test_remove_helpers() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        let tree = dir.path().join("t");
        std::fs::write(&file, b"x").unwrap();
        std::fs::create_dir_all(tree.join("inner")).unwrap();
        std::fs::write(tree.join("inner/g"), b"y").unwrap();

        remove_file(&file).await.unwrap();
        remove_tree(&tree).await.unwrap();
        assert!(!file.exists());
        assert!(!tree.exists());

        let err = remove_file(&file).await.unwrap_err();
        assert!(matches!(err, SyncError::RemoveFailure { .. }));
    }
}
