//! Recursive synchronization engine
//!
//! The [`SyncEngine`] brings a replica tree into exact correspondence with
//! a source tree. One call to [`SyncEngine::run_pass`] is one pass.
//!
//! ## Pass Flow
//!
//! For each [`SyncPair`] taken from the worklist (starting with the root):
//!
//! 1. **Diff**: list both sides and partition the names
//! 2. **Create**: names only in source become `CreateDirectory` / `CreateFile`
//! 3. **Prune**: names only in replica become `DeleteDirectory` / `DeleteFile`
//! 4. **Reconcile**: common directories are pushed onto the worklist, common
//!    files are compared and `UpdateFile`d when they differ, kind collisions
//!    follow the [`KindMismatchPolicy`]
//!
//! The worklist replaces native recursion, so tree depth does not grow the
//! call stack. Source trees are assumed acyclic.
//!
//! ## Failure Handling
//!
//! Each step's outcome is recorded in the [`PassReport`]. Under
//! [`FailurePolicy::Abort`] the pass stops at the first failure; under
//! [`FailurePolicy::Continue`] the failing item (or, for a listing failure,
//! the whole subtree) is skipped and the pass carries on.
//!
//! ## Cancellation
//!
//! The shutdown token is checked before every directory level and before
//! every action. Once it fires, the action in flight completes and the pass
//! returns a report with `cancelled` set.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;

use foldersync_core::config::SyncConfig;
use foldersync_core::domain::{
    Action, CompareMode, EntryKind, FailurePolicy, FailureStage, KindMismatchPolicy, PassReport,
    SyncPair,
};
use foldersync_core::ports::ISyncEventSink;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::comparator::{classify_replica, classify_source, TreeComparator};
use crate::content::ContentComparator;
use crate::executor::MutationExecutor;
use crate::SyncError;

// ============================================================================
// EngineOptions
// ============================================================================

/// Policies applied by the engine during a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// How common files are compared
    pub compare: CompareMode,
    /// Directory-vs-file collisions
    pub kind_mismatch: KindMismatchPolicy,
    /// Whether a failure ends the pass
    pub on_error: FailurePolicy,
}

impl From<&SyncConfig> for EngineOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            compare: config.compare,
            kind_mismatch: config.kind_mismatch,
            on_error: config.on_error,
        }
    }
}

/// Why a pass ended early
enum Halt {
    /// A failure under [`FailurePolicy::Abort`]
    Failed,
    /// The shutdown token fired
    Cancelled,
}

/// Outcome of one step: `Err(Halt)` unwinds to [`SyncEngine::run_pass`]
type Step = Result<(), Halt>;

/// Outcome of one action: `Ok(false)` when it failed and the pass continues
type Applied = Result<bool, Halt>;

// ============================================================================
// SyncEngine
// ============================================================================

/// One-way tree mirroring engine
///
/// ## Dependencies
///
/// - `tree`: lists and partitions one level of a pair
/// - `content`: decides whether two common files are identical
/// - `executor`: applies actions and reports them to the sink
/// - `sink`: receives failures raised outside the executor and pass summaries
pub struct SyncEngine {
    tree: TreeComparator,
    content: ContentComparator,
    executor: MutationExecutor,
    sink: Arc<dyn ISyncEventSink>,
    options: EngineOptions,
    shutdown: CancellationToken,
}

impl SyncEngine {
    /// Creates a new `SyncEngine` reporting to `sink`
    pub fn new(sink: Arc<dyn ISyncEventSink>, options: EngineOptions) -> Self {
        Self {
            tree: TreeComparator::new(),
            content: ContentComparator::new(options.compare),
            executor: MutationExecutor::new(Arc::clone(&sink)),
            sink,
            options,
            shutdown: CancellationToken::new(),
        }
    }

    /// Makes passes stop early once `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Creates an engine from the `sync` configuration section
    pub fn from_config(config: &SyncConfig, sink: Arc<dyn ISyncEventSink>) -> Self {
        Self::new(sink, EngineOptions::from(config))
    }

    /// The policies this engine applies
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    // ========================================================================
    // SyncEngine::run_pass()
    // ========================================================================

    /// Runs one full pass over `root`
    ///
    /// Both sides of `root` must already exist as directories; a missing
    /// side is recorded as a listing failure and nothing is mutated.
    /// The returned report is also handed to the sink.
    #[instrument(level = "trace", skip_all, fields(pair = %root))]
    pub async fn run_pass(&self, root: &SyncPair) -> PassReport {
        let mut report = PassReport::begin();
        debug!(pair = %root, "Starting pass");

        match self.walk(root, &mut report).await {
            Ok(()) => {}
            Err(Halt::Failed) => warn!("Pass stopped at first failure"),
            Err(Halt::Cancelled) => info!("Pass interrupted by shutdown request"),
        }

        report.finish();
        self.sink.pass_finished(&report);
        report
    }

    /// Reconciles levels off the worklist until it is empty
    async fn walk(&self, root: &SyncPair, report: &mut PassReport) -> Step {
        self.check_roots(root, report).await?;

        let mut worklist = vec![root.clone()];
        while let Some(pair) = worklist.pop() {
            self.interrupted(report)?;
            self.reconcile_level(&pair, &mut worklist, report).await?;
        }
        Ok(())
    }

    /// Verifies that both roots are directories
    async fn check_roots(&self, root: &SyncPair, report: &mut PassReport) -> Step {
        match classify_source(root.source_dir()).await {
            Ok(EntryKind::Directory) => {}
            Ok(_) => {
                let err = SyncError::SourceRootMissing(root.source_dir().to_path_buf());
                return self.fault(err, report);
            }
            Err(e) => return self.fault(e, report),
        }

        match tokio::fs::metadata(root.replica_dir()).await {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => self.fault(
                SyncError::ListingFailure {
                    path: root.replica_dir().to_path_buf(),
                    source: std::io::Error::other("replica root is not a directory"),
                },
                report,
            ),
            Err(source) => self.fault(
                SyncError::ListingFailure {
                    path: root.replica_dir().to_path_buf(),
                    source,
                },
                report,
            ),
        }
    }

    // ========================================================================
    // reconcile_level()
    // ========================================================================

    /// Reconciles one level of `pair`, queueing common subdirectories
    async fn reconcile_level(
        &self,
        pair: &SyncPair,
        worklist: &mut Vec<SyncPair>,
        report: &mut PassReport,
    ) -> Step {
        let diff = match self.tree.diff(pair).await {
            Ok(diff) => diff,
            Err(e) => return self.fault(e, report),
        };
        report.directories_visited += 1;

        for name in &diff.only_in_source {
            self.handle_source_only(pair, name, report).await?;
        }

        for name in &diff.only_in_replica {
            self.handle_replica_only(pair, name, report).await?;
        }

        for name in &diff.in_both {
            self.handle_common(pair, name, worklist, report).await?;
        }

        Ok(())
    }

    /// Copies an entry that exists only in source
    async fn handle_source_only(
        &self,
        pair: &SyncPair,
        name: &OsStr,
        report: &mut PassReport,
    ) -> Step {
        let source = pair.source_entry(name);
        let kind = match classify_source(&source).await {
            Ok(kind) => kind,
            Err(e) => return self.fault(e, report),
        };

        self.create(kind, source, pair.replica_entry(name), report)
            .await
            .map(drop)
    }

    /// Removes an entry that exists only in the replica
    async fn handle_replica_only(
        &self,
        pair: &SyncPair,
        name: &OsStr,
        report: &mut PassReport,
    ) -> Step {
        let dest = pair.replica_entry(name);
        let kind = match classify_replica(&dest).await {
            Ok(kind) => kind,
            Err(e) => return self.fault(e, report),
        };

        self.delete(kind, dest, report).await.map(drop)
    }

    /// Reconciles an entry present on both sides
    async fn handle_common(
        &self,
        pair: &SyncPair,
        name: &OsStr,
        worklist: &mut Vec<SyncPair>,
        report: &mut PassReport,
    ) -> Step {
        let source = pair.source_entry(name);
        let dest = pair.replica_entry(name);

        let source_kind = match classify_source(&source).await {
            Ok(kind) => kind,
            Err(e) => return self.fault(e, report),
        };
        let replica_kind = match classify_replica(&dest).await {
            Ok(kind) => kind,
            Err(e) => return self.fault(e, report),
        };

        match (source_kind, replica_kind) {
            (EntryKind::Other, _) => {
                warn!(path = %source.display(), "Skipping entry that is neither file nor directory");
                Ok(())
            }
            (EntryKind::Directory, EntryKind::Directory) => {
                worklist.push(pair.child(name));
                Ok(())
            }
            (EntryKind::File, EntryKind::File) => {
                match self.content.same(&source, &dest).await {
                    Ok(true) => {
                        report.files_unchanged += 1;
                        Ok(())
                    }
                    Ok(false) => self
                        .execute(Action::UpdateFile { source, dest }, report)
                        .await
                        .map(drop),
                    Err(e) => self.fault(e, report),
                }
            }
            (source_kind, replica_kind) => {
                self.resolve_mismatch(source_kind, replica_kind, source, dest, report)
                    .await
            }
        }
    }

    // ========================================================================
    // Kind mismatch
    // ========================================================================

    /// Applies the [`KindMismatchPolicy`] to a name whose kinds differ
    async fn resolve_mismatch(
        &self,
        source_kind: EntryKind,
        replica_kind: EntryKind,
        source: PathBuf,
        dest: PathBuf,
        report: &mut PassReport,
    ) -> Step {
        match self.options.kind_mismatch {
            KindMismatchPolicy::Ignore => {
                debug!(
                    path = %dest.display(),
                    %source_kind,
                    %replica_kind,
                    "Kind mismatch left unresolved"
                );
                Ok(())
            }
            KindMismatchPolicy::Replace => {
                info!(
                    path = %dest.display(),
                    %source_kind,
                    %replica_kind,
                    "Replacing replica entry of the wrong kind"
                );
                // A replica entry that could not be removed blocks the create.
                if self.delete(replica_kind, dest.clone(), report).await? {
                    self.create(source_kind, source, dest, report).await?;
                }
                Ok(())
            }
        }
    }

    // ========================================================================
    // Action helpers
    // ========================================================================

    /// Creates `dest` from `source` according to the source kind
    async fn create(
        &self,
        kind: EntryKind,
        source: PathBuf,
        dest: PathBuf,
        report: &mut PassReport,
    ) -> Applied {
        let action = match kind {
            EntryKind::Directory => Action::CreateDirectory { source, dest },
            EntryKind::File => Action::CreateFile { source, dest },
            EntryKind::Other => {
                warn!(path = %source.display(), "Skipping entry that is neither file nor directory");
                return Ok(false);
            }
        };
        self.execute(action, report).await
    }

    /// Removes `dest` according to its replica kind
    async fn delete(
        &self,
        kind: EntryKind,
        dest: PathBuf,
        report: &mut PassReport,
    ) -> Applied {
        let action = if kind.is_dir() {
            Action::DeleteDirectory { dest }
        } else {
            Action::DeleteFile { dest }
        };
        self.execute(action, report).await
    }

    /// Runs `action` through the executor and records its outcome
    async fn execute(&self, action: Action, report: &mut PassReport) -> Applied {
        self.interrupted(report)?;

        match self.executor.apply(&action).await {
            Ok(()) => {
                report.record(action.kind());
                Ok(true)
            }
            Err(e) => {
                // The executor already reported this failure to the sink.
                report.fail(FailureStage::Action(action.kind()), e.path(), e.to_string());
                self.halt_or_continue().map(|()| false)
            }
        }
    }

    /// Records a failure raised outside the executor
    fn fault(&self, err: SyncError, report: &mut PassReport) -> Step {
        let stage = err.stage();
        let message = err.to_string();

        self.sink.action_failed(stage, err.path(), &message);
        report.fail(stage, err.path(), message);
        self.halt_or_continue()
    }

    fn halt_or_continue(&self) -> Step {
        if self.options.on_error.stops_on_failure() {
            Err(Halt::Failed)
        } else {
            Ok(())
        }
    }

    /// Marks the report and halts once shutdown was requested
    fn interrupted(&self, report: &mut PassReport) -> Step {
        if self.shutdown.is_cancelled() {
            report.cancelled = true;
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
