//! Artifact storage for the model orchestrator
//!
//! This crate manages the on-disk directory tree of runtime-loadable
//! artifacts and turns uploaded model repositories into named artifacts.

pub mod filesystem;
pub mod package;

// Re-export commonly used types
pub use filesystem::{ArtifactStore, StoredArtifact, StoredFile};
pub use package::{artifact_name, ArtifactFile, PackagedArtifact, UploadPackage};
