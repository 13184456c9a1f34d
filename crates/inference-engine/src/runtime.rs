//! Inference runtime interface
//!
//! The control plane only ever talks to the serving engine through this
//! trait. Artifacts are addressed by their runtime-unique name and the
//! version string the runtime serves them under.

use async_trait::async_trait;

use common::error::Result;

use crate::tensor::{ArtifactConfig, ArtifactMetadata, RawOutput};

/// Adapter over an inference serving engine
#[async_trait]
pub trait InferenceRuntime: Send + Sync {
    /// Whether the runtime is ready to serve requests. Transport failures
    /// count as not ready.
    async fn is_ready(&self) -> bool;

    /// Loads an artifact from the shared model repository
    async fn load_artifact(&self, name: &str) -> Result<()>;

    /// Unloads an artifact; succeeds if it is already absent
    async fn unload_artifact(&self, name: &str) -> Result<()>;

    /// Metadata of a loaded artifact, `None` if the runtime doesn't know it
    async fn metadata(&self, name: &str, version: &str) -> Result<Option<ArtifactMetadata>>;

    /// Configuration of a loaded artifact, `None` if the runtime doesn't know it
    async fn config(&self, name: &str, version: &str) -> Result<Option<ArtifactConfig>>;

    /// Runs one batched inference call
    async fn infer(
        &self,
        name: &str,
        version: &str,
        inputs: &[Vec<u8>],
        metadata: &ArtifactMetadata,
        config: &ArtifactConfig,
    ) -> Result<RawOutput>;
}
