//! Model registry
//!
//! Validated CRUD over models, versions and their runtime artifacts. The
//! registry owns no storage itself; it delegates to a [`MetadataStore`] and
//! adds the checks callers rely on (name format, uniqueness, existence).

use std::sync::Arc;

use tracing::{debug, info};

use common::error::{Error, Result};
use common::models::{
    Model, ModelId, ModelInfo, NewModel, NewVersion, RuntimeArtifact, Version, VersionPatch,
};
use common::utils::validate_model_name;

use crate::store::{MetadataStore, VersionDeletion};

/// Registry of models and their versions
#[derive(Clone)]
pub struct ModelRegistry {
    /// Backing metadata store
    store: Arc<dyn MetadataStore>,
}

impl ModelRegistry {
    /// Creates a new registry over a metadata store
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Creates a model
    ///
    /// Returns `Err(Error::Validation)` for a malformed name and
    /// `Err(Error::Conflict)` if the name is taken in the namespace.
    pub async fn create_model(&self, spec: NewModel) -> Result<Model> {
        validate_model_name(&spec.name)?;
        if spec.namespace.trim().is_empty() {
            return Err(Error::Validation("Namespace must not be empty".to_string()));
        }

        let model = self.store.insert_model(&spec).await?;

        info!(
            model_id = model.id,
            namespace = %model.namespace,
            name = %model.name,
            task = %model.task,
            "Created model"
        );

        Ok(model)
    }

    pub async fn get_model(&self, id: ModelId) -> Result<Model> {
        self.store.get_model(id).await
    }

    /// Looks up a model by namespace and name
    pub async fn get_model_by_name(&self, namespace: &str, name: &str) -> Result<Model> {
        self.store
            .find_model(namespace, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Model not found: {}/{}", namespace, name)))
    }

    pub async fn list_models(&self, namespace: &str) -> Result<Vec<Model>> {
        self.store.list_models(namespace).await
    }

    /// Deletes the metadata of a model, its versions and artifacts
    pub async fn delete_model(&self, id: ModelId) -> Result<()> {
        self.store.delete_model(id).await?;
        info!(model_id = id, "Deleted model metadata");
        Ok(())
    }

    /// Creates the next version of a model
    pub async fn create_version(&self, model_id: ModelId, spec: NewVersion) -> Result<Version> {
        let version = self.store.insert_version(model_id, &spec).await?;

        info!(model_id, version = version.number, status = %version.status, "Created version");

        Ok(version)
    }

    pub async fn get_version(&self, model_id: ModelId, number: u32) -> Result<Version> {
        self.store.get_version(model_id, number).await
    }

    pub async fn list_versions(&self, model_id: ModelId) -> Result<Vec<Version>> {
        self.store.list_versions(model_id).await
    }

    /// Highest-numbered version; `Err(Error::NotFound)` if the model has none
    pub async fn get_latest_version(&self, model_id: ModelId) -> Result<Version> {
        self.store
            .latest_version(model_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Model {} has no versions", model_id)))
    }

    pub async fn update_version(&self, model_id: ModelId, number: u32, patch: VersionPatch) -> Result<Version> {
        let version = self.store.update_version(model_id, number, &patch).await?;

        debug!(model_id, version = number, status = %version.status, "Updated version");

        Ok(version)
    }

    /// Deletes a version; the model goes with it when no versions remain
    pub async fn delete_version(&self, model_id: ModelId, number: u32) -> Result<VersionDeletion> {
        let deletion = self.store.delete_version(model_id, number).await?;

        if deletion.model_deleted {
            info!(model_id, version = number, "Deleted last version, model removed");
        } else {
            info!(model_id, version = number, remaining = deletion.remaining, "Deleted version");
        }

        Ok(deletion)
    }

    pub async fn register_artifact(&self, artifact: RuntimeArtifact) -> Result<()> {
        self.store.insert_artifact(&artifact).await?;
        debug!(artifact = %artifact.name, model_id = artifact.model_id, version = artifact.version, "Registered artifact");
        Ok(())
    }

    /// Artifacts of every version of a model
    pub async fn artifacts(&self, model_id: ModelId) -> Result<Vec<RuntimeArtifact>> {
        self.store.list_artifacts(model_id).await
    }

    pub async fn version_artifacts(&self, model_id: ModelId, number: u32) -> Result<Vec<RuntimeArtifact>> {
        self.store.list_version_artifacts(model_id, number).await
    }

    /// The ensemble entry point of a version
    pub async fn ensemble_artifact(&self, model_id: ModelId, number: u32) -> Result<RuntimeArtifact> {
        self.version_artifacts(model_id, number)
            .await?
            .into_iter()
            .find(|a| a.ensemble)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No ensemble artifact registered for model {} version {}",
                    model_id, number
                ))
            })
    }

    /// Model together with its versions and artifacts
    pub async fn model_info(&self, model_id: ModelId) -> Result<ModelInfo> {
        let model = self.store.get_model(model_id).await?;
        let versions = self.store.list_versions(model_id).await?;
        let artifacts = self.store.list_artifacts(model_id).await?;

        Ok(ModelInfo {
            model,
            versions,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use common::models::{Task, VersionStatus};

    fn registry() -> ModelRegistry {
        ModelRegistry::new(Arc::new(InMemoryStore::new()))
    }

    fn spec(name: &str) -> NewModel {
        NewModel {
            namespace: "users/local-user".to_string(),
            name: name.to_string(),
            task: Task::Detection,
        }
    }

    #[tokio::test]
    async fn test_create_model_validates_name() {
        let registry = registry();

        for bad in ["", "-leading-dash", "has space", "slash/name", "_under"] {
            let err = registry.create_model(spec(bad)).await.unwrap_err();
            assert!(err.is_validation(), "{:?} gave {}", bad, err);
        }

        let model = registry.create_model(spec("yolo-v5.1_b")).await.unwrap();
        assert_eq!(model.name, "yolo-v5.1_b");
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let registry = registry();
        registry.create_model(spec("dup")).await.unwrap();

        let err = registry.create_model(spec("dup")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let registry = registry();
        let created = registry.create_model(spec("named")).await.unwrap();

        let found = registry.get_model_by_name("users/local-user", "named").await.unwrap();
        assert_eq!(found.id, created.id);

        let err = registry
            .get_model_by_name("users/local-user", "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_latest_version_of_empty_model() {
        let registry = registry();
        let model = registry.create_model(spec("empty")).await.unwrap();

        assert!(registry.get_latest_version(model.id).await.unwrap_err().is_not_found());

        registry.create_version(model.id, NewVersion::default()).await.unwrap();
        registry.create_version(model.id, NewVersion::default()).await.unwrap();
        assert_eq!(registry.get_latest_version(model.id).await.unwrap().number, 2);
    }

    #[tokio::test]
    async fn test_concurrent_version_creation_allocates_distinct_numbers() {
        let registry = registry();
        let model = registry.create_model(spec("parallel")).await.unwrap();

        let tasks = (0..16).map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.create_version(model.id, NewVersion::default()).await })
        });
        let mut numbers: Vec<u32> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().number)
            .collect();
        numbers.sort_unstable();

        assert_eq!(numbers, (1..=16).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_ensemble_artifact_lookup() {
        let registry = registry();
        let model = registry.create_model(spec("ens")).await.unwrap();
        registry.create_version(model.id, NewVersion::default()).await.unwrap();

        assert!(registry.ensemble_artifact(model.id, 1).await.unwrap_err().is_not_found());

        for (component, ensemble) in [("pre", false), ("ensemble", true)] {
            registry
                .register_artifact(RuntimeArtifact {
                    name: format!("local-user#ens#{}#1", component),
                    model_id: model.id,
                    version: 1,
                    runtime_version: 1,
                    ensemble,
                })
                .await
                .unwrap();
        }

        let ensemble = registry.ensemble_artifact(model.id, 1).await.unwrap();
        assert_eq!(ensemble.name, "local-user#ens#ensemble#1");

        let info = registry.model_info(model.id).await.unwrap();
        assert_eq!(info.versions.len(), 1);
        assert_eq!(info.artifacts.len(), 2);
        assert_eq!(info.latest_version().map(|v| v.status), Some(VersionStatus::Offline));
    }

    #[tokio::test]
    async fn test_delete_last_version_removes_model() {
        let registry = registry();
        let model = registry.create_model(spec("gone")).await.unwrap();
        registry.create_version(model.id, NewVersion::default()).await.unwrap();

        let deletion = registry.delete_version(model.id, 1).await.unwrap();
        assert!(deletion.model_deleted);
        assert!(registry.get_model(model.id).await.unwrap_err().is_not_found());
    }
}
