//! FolderSync Core - Domain types and configuration
//!
//! This crate contains the pieces shared by the mirroring engine and the
//! service binary:
//! - **Domain types** - `SyncPair`, `EntryKind`, `Action`, `PassReport`
//! - **Policies** - `CompareMode`, `KindMismatchPolicy`, `FailurePolicy`
//! - **Port definitions** - `ISyncEventSink`, the sink every applied action is reported to
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module has no filesystem side effects. Adapters living in
//! `foldersync-sync` perform the actual I/O and report back through the
//! ports defined here.

pub mod config;
pub mod domain;
pub mod ports;
