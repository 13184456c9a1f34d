//! Model lifecycle orchestration
//!
//! Ties the model registry, the artifact store and the inference runtime
//! together: per-version status transitions, best-effort deletes and the
//! [`ModelService`] facade the command surface drives.

pub mod engine;
pub mod lifecycle;
pub mod locks;
pub mod metrics;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use engine::{Orchestrator, OrchestratorOptions};
pub use lifecycle::VersionLifecycle;
pub use locks::KeyedLocks;
pub use service::{ModelService, ModelUpdate, UploadRequest};
pub use state::TargetStatus;
