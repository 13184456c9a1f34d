//! Logging for the model orchestrator
//!
//! This crate installs the process-wide `tracing` subscriber with
//! configurable filtering, output format and destination.

pub mod logger;

// Re-export commonly used types
pub use logger::{build_filter, init, LogFormat, LogGuard};
