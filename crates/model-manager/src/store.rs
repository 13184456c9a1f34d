//! Metadata store interface
//!
//! The relational store is the single source of truth for model and version
//! state. Implementations own all storage details and must make version-number
//! allocation and cascading deletes atomic.

use async_trait::async_trait;

use common::error::Result;
use common::models::{Model, ModelId, NewModel, NewVersion, RuntimeArtifact, Version, VersionPatch};

/// Outcome of deleting a version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDeletion {
    /// Versions left on the model
    pub remaining: usize,
    /// Whether the model itself was deleted because no versions remained
    pub model_deleted: bool,
}

/// CRUD over models, versions and runtime artifacts
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts a model.
    ///
    /// Returns `Err(Error::Conflict)` if `(namespace, name)` is taken.
    async fn insert_model(&self, model: &NewModel) -> Result<Model>;

    /// Returns `Err(Error::NotFound)` if the model doesn't exist.
    async fn get_model(&self, id: ModelId) -> Result<Model>;

    async fn find_model(&self, namespace: &str, name: &str) -> Result<Option<Model>>;

    /// Models of a namespace ordered by id.
    async fn list_models(&self, namespace: &str) -> Result<Vec<Model>>;

    /// Deletes a model with all its versions and artifacts.
    async fn delete_model(&self, id: ModelId) -> Result<()>;

    /// Inserts a version numbered one past the highest number ever allocated
    /// for the model. Allocation is atomic with respect to concurrent calls.
    async fn insert_version(&self, model_id: ModelId, version: &NewVersion) -> Result<Version>;

    async fn get_version(&self, model_id: ModelId, number: u32) -> Result<Version>;

    /// Versions of a model ordered by number.
    async fn list_versions(&self, model_id: ModelId) -> Result<Vec<Version>>;

    async fn latest_version(&self, model_id: ModelId) -> Result<Option<Version>>;

    /// Applies a patch and stamps `updated_at` on the version and its model.
    async fn update_version(&self, model_id: ModelId, number: u32, patch: &VersionPatch) -> Result<Version>;

    /// Deletes a version and its artifacts; deletes the model too when it
    /// was the last version.
    async fn delete_version(&self, model_id: ModelId, number: u32) -> Result<VersionDeletion>;

    /// Returns `Err(Error::Conflict)` on a duplicate artifact name and
    /// `Err(Error::NotFound)` if the owning version doesn't exist.
    async fn insert_artifact(&self, artifact: &RuntimeArtifact) -> Result<()>;

    /// Artifacts of every version of a model.
    async fn list_artifacts(&self, model_id: ModelId) -> Result<Vec<RuntimeArtifact>>;

    async fn list_version_artifacts(&self, model_id: ModelId, number: u32) -> Result<Vec<RuntimeArtifact>>;
}
