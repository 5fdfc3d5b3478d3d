//! Mutation executor - applies single actions to the replica tree
//!
//! Every operation reports to the injected [`ISyncEventSink`]: one
//! `action_applied` record on success (a whole copied subtree is a single
//! record), one `action_failed` record with the path and underlying error
//! on failure. Failures are returned to the caller, never turned into a
//! process exit here.

use std::path::Path;
use std::sync::Arc;

use foldersync_core::domain::{Action, FailureStage};
use foldersync_core::ports::ISyncEventSink;

use crate::{filesystem, SyncError};

// ============================================================================
// MutationExecutor
// ============================================================================

/// Applies [`Action`]s and reports their outcome
#[derive(Clone)]
pub struct MutationExecutor {
    sink: Arc<dyn ISyncEventSink>,
}

impl MutationExecutor {
    /// Creates an executor reporting to `sink`
    pub fn new(sink: Arc<dyn ISyncEventSink>) -> Self {
        Self { sink }
    }

    /// Applies `action`, reporting success or failure to the sink
    pub async fn apply(&self, action: &Action) -> Result<(), SyncError> {
        let result = match action {
            Action::CreateFile { source, dest } => create_file(source, dest).await,
            Action::CreateDirectory { source, dest } => {
                filesystem::copy_tree(source, dest).await.map(|_| ())
            }
            Action::UpdateFile { source, dest } => filesystem::copy_file(source, dest).await,
            Action::DeleteFile { dest } => filesystem::remove_file(dest).await,
            Action::DeleteDirectory { dest } => filesystem::remove_tree(dest).await,
        };

        match &result {
            Ok(()) => self.sink.action_applied(action),
            Err(e) => self.sink.action_failed(
                FailureStage::Action(action.kind()),
                e.path(),
                &e.to_string(),
            ),
        }
        result
    }
}

impl std::fmt::Debug for MutationExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationExecutor").finish_non_exhaustive()
    }
}

/// Copies a file to a destination that must not exist yet
async fn create_file(source: &Path, dest: &Path) -> Result<(), SyncError> {
    if tokio::fs::symlink_metadata(dest).await.is_ok() {
        return Err(SyncError::CopyFailure {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "destination already exists",
            ),
        });
    }
    filesystem::copy_file(source, dest).await
}
