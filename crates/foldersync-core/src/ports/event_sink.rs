//! Sync event sink port (driven/secondary port)
//!
//! The executor and the engine report every applied action and every
//! failure through an [`ISyncEventSink`] handed to them at construction,
//! instead of writing to a process-wide logger.
//!
//! ## Design Notes
//!
//! - Callbacks are synchronous: they are invoked inline between two
//!   filesystem operations and must not block for long.
//! - Implementations must be thread-safe even though a pass runs on a
//!   single task, so one sink can be shared with the scheduler.

use std::path::Path;

use crate::domain::{Action, FailureStage, PassReport};

// ============================================================================
// ISyncEventSink trait
// ============================================================================

/// Receiver for per-action records of a synchronization pass
pub trait ISyncEventSink: Send + Sync {
    /// Called after `action` completed successfully
    fn action_applied(&self, action: &Action);

    /// Called when a step failed
    ///
    /// # Arguments
    /// * `stage` - Which step failed (listing, compare, or an action kind)
    /// * `path` - The offending path
    /// * `cause` - Underlying error text
    fn action_failed(&self, stage: FailureStage, path: &Path, cause: &str);

    /// Called once the engine has finished a pass
    fn pass_finished(&self, report: &PassReport) {
        let _ = report;
    }
}
