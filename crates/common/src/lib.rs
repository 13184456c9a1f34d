//! Common utilities and types for the model orchestrator
//!
//! This crate provides shared functionality used across the workspace,
//! including the error taxonomy, metadata records, prediction types,
//! cleanup bookkeeping and request limits.

pub mod cleanup;
pub mod error;
pub mod models;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use cleanup::{CleanupFailure, CleanupResult, CleanupStage};
pub use error::{Error, Result};
pub use models::*;
pub use types::*;
