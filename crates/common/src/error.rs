//! Error types for the common crate
//!
//! This module defines the error taxonomy shared by every crate of the model
//! orchestrator. Variants map one-to-one onto the failure classes callers are
//! expected to distinguish: validation, conflicts, missing records, runtime
//! availability and failed status transitions.

use thiserror::Error;

/// Result type for model orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for model orchestrator operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request rejected before touching any store or the runtime
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inference runtime is not ready to serve requests
    #[error("Inference runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// Inference runtime rejected or failed a call
    #[error("Inference runtime error: {0}")]
    Runtime(String),

    /// A status transition failed; the version has been marked ERROR
    #[error("Transition of model {model_id} version {version} to {target} failed: {source}")]
    TransitionFailed {
        /// Owning model id
        model_id: i64,
        /// Version number
        version: u32,
        /// Requested status
        target: String,
        /// Error raised by the runtime call
        #[source]
        source: Box<Error>,
    },

    /// Writing the ERROR status after a failed transition did not succeed
    #[error("Failed to record ERROR status for model {model_id} version {version}: {message}")]
    StatusWriteFailed {
        /// Owning model id
        model_id: i64,
        /// Version number
        version: u32,
        /// Both the transition error and the write error
        message: String,
    },

    /// Raw runtime output could not be decoded
    #[error("Unable to decode inference output: {0}")]
    Decode(String),

    /// Artifact storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata store error
    #[error("Database error: {0}")]
    Database(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The caller's deadline was cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Authentication error
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if the error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the error is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Returns true if the error is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Returns true if the runtime was not ready
    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(self, Error::RuntimeUnavailable(_))
    }

    /// Returns true if a status transition failed
    pub fn is_transition_failed(&self) -> bool {
        matches!(self, Error::TransitionFailed { .. })
    }

    /// Returns true if the error is a decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }

    /// Returns true if the error is an authentication error
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Error::Unauthenticated(_))
    }

    /// Returns true if the error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
