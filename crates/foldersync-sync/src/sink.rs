//! Event sink adapters
//!
//! - [`TracingEventSink`] turns every record into a `tracing` event: DEBUG
//!   for applied actions, ERROR for failures, INFO for pass summaries.
//! - [`RecordingSink`] keeps records in memory, for embedding and tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use foldersync_core::domain::{Action, ActionKind, FailureStage, PassReport};
use foldersync_core::ports::ISyncEventSink;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

// ============================================================================
// TracingEventSink
// ============================================================================

/// Sink that forwards records to the installed `tracing` subscriber
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    /// Create a new `TracingEventSink`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ISyncEventSink for TracingEventSink {
    fn action_applied(&self, action: &Action) {
        debug!("{}", action);
    }

    fn action_failed(&self, stage: FailureStage, path: &Path, cause: &str) {
        error!(
            "Unexpected error occurred during {} of {}: {}",
            stage,
            path.display(),
            cause
        );
    }

    fn pass_finished(&self, report: &PassReport) {
        info!(
            created_files = report.files_created,
            created_dirs = report.directories_created,
            updated = report.files_updated,
            deleted_files = report.files_deleted,
            deleted_dirs = report.directories_deleted,
            unchanged = report.files_unchanged,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "Pass completed"
        );
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// A single record captured by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkRecord {
    /// An action completed
    Applied(Action),
    /// A step failed
    Failed {
        /// Failing step
        stage: FailureStage,
        /// Offending path
        path: PathBuf,
        /// Error text
        cause: String,
    },
    /// A pass finished with this many mutations and failures
    PassFinished {
        /// Successful actions in the pass
        mutations: u32,
        /// Failures in the pass
        failures: usize,
    },
}

/// In-memory sink that stores every record it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SinkRecord>>,
    cancel_on_apply: Option<CancellationToken>,
}

impl RecordingSink {
    /// Create an empty `RecordingSink`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that cancels `token` as soon as an action is applied
    ///
    /// Lets a caller interrupt a pass at a known point.
    #[must_use]
    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            records: Mutex::default(),
            cancel_on_apply: Some(token),
        }
    }

    fn push(&self, record: SinkRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    /// Snapshot of all records so far
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Applied actions, in order
    pub fn applied(&self) -> Vec<Action> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Applied(action) => Some(action),
                _ => None,
            })
            .collect()
    }

    /// Kinds of the applied actions, in order
    pub fn applied_kinds(&self) -> Vec<ActionKind> {
        self.applied().iter().map(Action::kind).collect()
    }

    /// Number of failure records
    pub fn failure_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|record| matches!(record, SinkRecord::Failed { .. }))
            .count()
    }

    /// Drops all records
    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl ISyncEventSink for RecordingSink {
    fn action_applied(&self, action: &Action) {
        self.push(SinkRecord::Applied(action.clone()));
        if let Some(token) = &self.cancel_on_apply {
            token.cancel();
        }
    }

    fn action_failed(&self, stage: FailureStage, path: &Path, cause: &str) {
        self.push(SinkRecord::Failed {
            stage,
            path: path.to_path_buf(),
            cause: cause.to_string(),
        });
    }

    fn pass_finished(&self, report: &PassReport) {
        self.push(SinkRecord::PassFinished {
            mutations: report.mutations(),
            failures: report.failures.len(),
        });
    }
}
