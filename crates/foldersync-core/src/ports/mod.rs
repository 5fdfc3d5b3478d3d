//! Port definitions (hexagonal architecture)
//!
//! Ports are trait interfaces implemented by adapters outside the core.
//!
//! ## Driven ports (secondary)
//! - [`event_sink`] - `ISyncEventSink` for reporting applied and failed actions

pub mod event_sink;

pub use event_sink::ISyncEventSink;
