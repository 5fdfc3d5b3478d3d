//! Domain entities for one-way tree mirroring
//!
//! This module contains the core domain types for FolderSync:
//! - Sync pairs and entry classification
//! - Actions applied to the replica tree
//! - Pass reports aggregating action outcomes
//! - Policies controlling comparison, kind collisions and failures
//! - Domain-specific error types

pub mod action;
pub mod errors;
pub mod policy;
pub mod report;
pub mod sync_pair;

// Re-export commonly used types
pub use action::{Action, ActionKind};
pub use errors::DomainError;
pub use policy::{CompareMode, FailurePolicy, KindMismatchPolicy};
pub use report::{ActionFailure, FailureStage, PassReport};
pub use sync_pair::{EntryKind, SyncPair};
