//! Pass reports
//!
//! A [`PassReport`] aggregates the outcome of every action attempted
//! during one pass so the scheduler can decide whether to keep looping.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::ActionKind;

// ============================================================================
// FailureStage / ActionFailure
// ============================================================================

/// Where in a pass a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Creating the replica root before the pass
    Bootstrap,
    /// Enumerating or probing a directory
    Listing,
    /// Reading two files to compare them
    Compare,
    /// Applying a mutation
    Action(ActionKind),
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Bootstrap => write!(f, "bootstrap"),
            FailureStage::Listing => write!(f, "listing"),
            FailureStage::Compare => write!(f, "compare"),
            FailureStage::Action(kind) => write!(f, "{}", kind),
        }
    }
}

/// A single failed step of a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    /// The step that failed
    pub stage: FailureStage,
    /// The offending path
    pub path: PathBuf,
    /// Underlying error text
    pub message: String,
}

impl ActionFailure {
    /// Creates a new failure record
    pub fn new(stage: FailureStage, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            stage,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {}: {}",
            self.stage,
            self.path.display(),
            self.message
        )
    }
}

// ============================================================================
// PassReport
// ============================================================================

/// Summary of one synchronization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Files copied into the replica
    pub files_created: u32,
    /// Subtrees copied into the replica
    pub directories_created: u32,
    /// Replica files overwritten from source
    pub files_updated: u32,
    /// Replica-only files removed
    pub files_deleted: u32,
    /// Replica-only subtrees removed
    pub directories_deleted: u32,
    /// Common files found identical
    pub files_unchanged: u32,
    /// Directory pairs reconciled (including the root)
    pub directories_visited: u32,
    /// Failures in the order they happened
    pub failures: Vec<ActionFailure>,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds, set by [`PassReport::finish`]
    pub duration_ms: u64,
    /// The pass was interrupted by a shutdown request
    #[serde(default)]
    pub cancelled: bool,
}

impl PassReport {
    /// Starts an empty report stamped with the current time
    pub fn begin() -> Self {
        Self {
            files_created: 0,
            directories_created: 0,
            files_updated: 0,
            files_deleted: 0,
            directories_deleted: 0,
            files_unchanged: 0,
            directories_visited: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
            cancelled: false,
        }
    }

    /// Stamps the duration since [`PassReport::begin`]
    pub fn finish(&mut self) {
        let elapsed = Utc::now() - self.started_at;
        self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
    }

    /// Counts one successful action
    pub fn record(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::CreateFile => self.files_created += 1,
            ActionKind::CreateDirectory => self.directories_created += 1,
            ActionKind::UpdateFile => self.files_updated += 1,
            ActionKind::DeleteFile => self.files_deleted += 1,
            ActionKind::DeleteDirectory => self.directories_deleted += 1,
        }
    }

    /// Number of successful actions of `kind`
    pub fn count(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::CreateFile => self.files_created,
            ActionKind::CreateDirectory => self.directories_created,
            ActionKind::UpdateFile => self.files_updated,
            ActionKind::DeleteFile => self.files_deleted,
            ActionKind::DeleteDirectory => self.directories_deleted,
        }
    }

    /// Records a failure
    pub fn fail(&mut self, stage: FailureStage, path: &Path, message: impl Into<String>) {
        self.failures.push(ActionFailure::new(stage, path, message));
    }

    /// Total number of successful mutations
    pub fn mutations(&self) -> u32 {
        ActionKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    /// Returns true when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Default for PassReport {
    fn default() -> Self {
        Self::begin()
    }
}
