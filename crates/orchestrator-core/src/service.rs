//! Model service capability
//!
//! The verbs the command surface is built on. Every method takes the
//! caller's namespace so one service instance can serve many owners.

use async_trait::async_trait;

use common::cleanup::CleanupResult;
use common::error::Result;
use common::models::{ModelInfo, Task};
use common::types::PredictionResult;
use storage_adapter::UploadPackage;

/// A model repository upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Owning namespace, e.g. `users/local-user`
    pub namespace: String,
    /// Model name; an existing model receives a new version
    pub name: String,
    pub task: Task,
    pub description: String,
    pub package: UploadPackage,
    /// Request ONLINE once the version is registered
    pub online: bool,
}

/// Fields of a version that may be changed; at least one must be set
#[derive(Debug, Clone, Default)]
pub struct ModelUpdate {
    /// `ONLINE` or `OFFLINE`; anything else is rejected before any change
    pub status: Option<String>,
    pub description: Option<String>,
}

/// Lifecycle operations over models and their versions
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Stores an upload as the next version of a model, creating the model
    /// if needed
    async fn create_model_by_upload(&self, request: UploadRequest) -> Result<ModelInfo>;

    /// All models of a namespace; fails when the runtime is not ready
    async fn list_models(&self, namespace: &str) -> Result<Vec<ModelInfo>>;

    async fn get_model(&self, namespace: &str, name: &str) -> Result<ModelInfo>;

    /// Changes status and/or description of a version (latest if `None`)
    async fn update_model(
        &self,
        namespace: &str,
        name: &str,
        version: Option<u32>,
        update: ModelUpdate,
    ) -> Result<ModelInfo>;

    /// Deletes a model; runtime and file cleanup is best-effort
    async fn delete_model(&self, namespace: &str, name: &str) -> Result<CleanupResult>;

    /// Deletes a version, and the model with it if it was the last one
    async fn delete_model_version(&self, namespace: &str, name: &str, version: u32) -> Result<CleanupResult>;

    /// Runs a batched prediction against a version (latest if `None`)
    async fn predict(
        &self,
        namespace: &str,
        name: &str,
        version: Option<u32>,
        inputs: Vec<Vec<u8>>,
    ) -> Result<PredictionResult>;
}
