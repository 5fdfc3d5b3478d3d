//! Sync scheduler - runs one pass per interval until cancelled
//!
//! The [`SyncScheduler`] owns a [`SyncEngine`] and the root [`SyncPair`].
//! Each iteration bootstraps the replica root, runs a pass, then sleeps.
//!
//! ## Flow
//!
//! ```text
//! bootstrap replica root ──→ SyncEngine::run_pass ──→ sleep(interval) ──┐
//!          ▲                                                            │
//!          └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passes never overlap: the sleep starts only after a pass has returned,
//! so a slow pass delays the cadence instead of bunching passes together.
//! The [`CancellationToken`] is handed to the engine as well, so a pass in
//! flight stops before its next action and the loop exits without sleeping.

use std::time::Duration;

use foldersync_core::domain::{FailurePolicy, FailureStage, PassReport, SyncPair};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::SyncEngine;
use crate::SyncError;

// ============================================================================
// SchedulerExit
// ============================================================================

/// Why [`SyncScheduler::run`] returned
#[derive(Debug)]
pub enum SchedulerExit {
    /// The cancellation token fired
    Cancelled,
    /// A pass failed under [`FailurePolicy::Abort`]
    Failed(PassReport),
}

impl SchedulerExit {
    /// Returns true if the scheduler stopped because of a failed pass
    pub fn is_failure(&self) -> bool {
        matches!(self, SchedulerExit::Failed(_))
    }
}

// ============================================================================
// SyncScheduler
// ============================================================================

/// Drives periodic, non-overlapping synchronization passes
pub struct SyncScheduler {
    /// Engine performing each pass
    engine: SyncEngine,
    /// Source and replica roots
    root: SyncPair,
    /// Pause between the end of a pass and the start of the next
    interval: Duration,
    /// Token for graceful shutdown
    shutdown: CancellationToken,
    /// Number of passes run so far
    passes: u64,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Arguments
    /// * `engine` - Engine used for every pass
    /// * `root` - The source/replica root pair
    /// * `interval` - Sleep between passes
    /// * `shutdown` - Token that stops the loop, and any running pass, when cancelled
    pub fn new(
        engine: SyncEngine,
        root: SyncPair,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        info!(
            pair = %root,
            interval_ms = interval.as_millis() as u64,
            on_error = %engine.options().on_error,
            "Creating sync scheduler"
        );

        Self {
            engine: engine.with_shutdown(shutdown.clone()),
            root,
            interval,
            shutdown,
            passes: 0,
        }
    }

    /// Number of passes completed
    pub fn passes(&self) -> u64 {
        self.passes
    }

    // ========================================================================
    // SyncScheduler::bootstrap_replica()
    // ========================================================================

    /// Creates the replica root if it does not exist yet
    ///
    /// Returns `true` when the directory was created. An existing root,
    /// whatever its content, is left alone.
    pub async fn bootstrap_replica(&self) -> Result<bool, SyncError> {
        let replica = self.root.replica_dir();
        if tokio::fs::metadata(replica).await.is_ok() {
            return Ok(false);
        }

        tokio::fs::create_dir_all(replica)
            .await
            .map_err(|source| SyncError::CopyFailure {
                from: self.root.source_dir().to_path_buf(),
                to: replica.to_path_buf(),
                source,
            })?;
        debug!(path = %replica.display(), "Directory {} is created", replica.display());
        Ok(true)
    }

    // ========================================================================
    // SyncScheduler::run_once()
    // ========================================================================

    /// Bootstraps the replica root and runs a single pass
    pub async fn run_once(&mut self) -> PassReport {
        let report = match self.bootstrap_replica().await {
            Ok(_) => self.engine.run_pass(&self.root).await,
            Err(e) => {
                error!(
                    path = %self.root.replica_dir().display(),
                    error = %e,
                    "Cannot create replica root"
                );
                let mut report = PassReport::begin();
                report.fail(FailureStage::Bootstrap, self.root.replica_dir(), e.to_string());
                report.finish();
                report
            }
        };

        self.passes += 1;
        report
    }

    // ========================================================================
    // SyncScheduler::run()
    // ========================================================================

    /// Main loop: pass, sleep, repeat until cancelled or a pass fails
    ///
    /// Under [`FailurePolicy::Continue`] failed passes are logged and the
    /// loop keeps going; under [`FailurePolicy::Abort`] the first failed
    /// pass ends the loop with [`SchedulerExit::Failed`].
    pub async fn run(&mut self) -> SchedulerExit {
        info!("Sync scheduler starting");

        loop {
            if self.shutdown.is_cancelled() {
                info!("Shutdown signal received");
                return SchedulerExit::Cancelled;
            }

            let report = self.run_once().await;

            if report.cancelled {
                info!(pass = self.passes, "Shutdown signal received during pass");
                return SchedulerExit::Cancelled;
            }

            if !report.is_clean() {
                match self.engine.options().on_error {
                    FailurePolicy::Abort => {
                        error!(
                            failures = report.failures.len(),
                            pass = self.passes,
                            "Pass failed, stopping"
                        );
                        return SchedulerExit::Failed(report);
                    }
                    FailurePolicy::Continue => {
                        warn!(
                            failures = report.failures.len(),
                            pass = self.passes,
                            "Pass finished with failures, continuing"
                        );
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    return SchedulerExit::Cancelled;
                }
            }
        }
    }
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("root", &self.root)
            .field("interval", &self.interval)
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit tests
// ============================================================================
