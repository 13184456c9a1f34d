//! In-memory metadata store
//!
//! All tables sit behind one lock so that multi-table operations (version
//! allocation, cascading deletes) are atomic, matching what a transaction
//! gives the SQLite store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use common::error::{Error, Result};
use common::models::{Model, ModelId, NewModel, NewVersion, RuntimeArtifact, Version, VersionPatch};

use crate::store::{MetadataStore, VersionDeletion};

struct ModelRow {
    model: Model,
    /// Highest version number ever allocated
    last_version: u32,
}

#[derive(Default)]
struct Tables {
    next_model_id: ModelId,
    models: BTreeMap<ModelId, ModelRow>,
    versions: BTreeMap<(ModelId, u32), Version>,
    artifacts: BTreeMap<String, RuntimeArtifact>,
}

impl Tables {
    fn model_row(&mut self, id: ModelId) -> Result<&mut ModelRow> {
        self.models
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Model not found: {}", id)))
    }

    fn version_range(&self, model_id: ModelId) -> impl Iterator<Item = &Version> {
        self.versions
            .range((model_id, 0)..=(model_id, u32::MAX))
            .map(|(_, v)| v)
    }
}

/// Metadata store kept in process memory
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn version_not_found(model_id: ModelId, number: u32) -> Error {
    Error::NotFound(format!("Version {} not found for model {}", number, model_id))
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn insert_model(&self, new: &NewModel) -> Result<Model> {
        let mut tables = self.tables.write();

        let taken = tables
            .models
            .values()
            .any(|row| row.model.namespace == new.namespace && row.model.name == new.name);
        if taken {
            return Err(Error::Conflict(format!(
                "The name {} is existing in namespace {}",
                new.name, new.namespace
            )));
        }

        tables.next_model_id += 1;
        let now = Utc::now();
        let model = Model {
            id: tables.next_model_id,
            namespace: new.namespace.clone(),
            name: new.name.clone(),
            task: new.task,
            created_at: now,
            updated_at: now,
        };

        tables.models.insert(
            model.id,
            ModelRow {
                model: model.clone(),
                last_version: 0,
            },
        );

        Ok(model)
    }

    async fn get_model(&self, id: ModelId) -> Result<Model> {
        self.tables
            .read()
            .models
            .get(&id)
            .map(|row| row.model.clone())
            .ok_or_else(|| Error::NotFound(format!("Model not found: {}", id)))
    }

    async fn find_model(&self, namespace: &str, name: &str) -> Result<Option<Model>> {
        Ok(self
            .tables
            .read()
            .models
            .values()
            .find(|row| row.model.namespace == namespace && row.model.name == name)
            .map(|row| row.model.clone()))
    }

    async fn list_models(&self, namespace: &str) -> Result<Vec<Model>> {
        Ok(self
            .tables
            .read()
            .models
            .values()
            .filter(|row| row.model.namespace == namespace)
            .map(|row| row.model.clone())
            .collect())
    }

    async fn delete_model(&self, id: ModelId) -> Result<()> {
        let mut tables = self.tables.write();

        if tables.models.remove(&id).is_none() {
            return Err(Error::NotFound(format!("Model not found: {}", id)));
        }
        tables.versions.retain(|(model_id, _), _| *model_id != id);
        tables.artifacts.retain(|_, a| a.model_id != id);

        Ok(())
    }

    async fn insert_version(&self, model_id: ModelId, new: &NewVersion) -> Result<Version> {
        let mut tables = self.tables.write();
        let now = Utc::now();

        let row = tables.model_row(model_id)?;
        row.last_version += 1;
        row.model.updated_at = now;
        let number = row.last_version;

        let version = Version {
            model_id,
            number,
            status: new.status,
            description: new.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.versions.insert((model_id, number), version.clone());

        Ok(version)
    }

    async fn get_version(&self, model_id: ModelId, number: u32) -> Result<Version> {
        self.tables
            .read()
            .versions
            .get(&(model_id, number))
            .cloned()
            .ok_or_else(|| version_not_found(model_id, number))
    }

    async fn list_versions(&self, model_id: ModelId) -> Result<Vec<Version>> {
        Ok(self.tables.read().version_range(model_id).cloned().collect())
    }

    async fn latest_version(&self, model_id: ModelId) -> Result<Option<Version>> {
        Ok(self.tables.read().version_range(model_id).last().cloned())
    }

    async fn update_version(&self, model_id: ModelId, number: u32, patch: &VersionPatch) -> Result<Version> {
        let mut tables = self.tables.write();
        let now = Utc::now();

        let version = tables
            .versions
            .get_mut(&(model_id, number))
            .ok_or_else(|| version_not_found(model_id, number))?;
        if let Some(status) = patch.status {
            version.status = status;
        }
        if let Some(description) = &patch.description {
            version.description = description.clone();
        }
        version.updated_at = now;
        let updated = version.clone();

        tables.model_row(model_id)?.model.updated_at = now;

        Ok(updated)
    }

    async fn delete_version(&self, model_id: ModelId, number: u32) -> Result<VersionDeletion> {
        let mut tables = self.tables.write();

        if tables.versions.remove(&(model_id, number)).is_none() {
            return Err(version_not_found(model_id, number));
        }
        tables
            .artifacts
            .retain(|_, a| !(a.model_id == model_id && a.version == number));

        let remaining = tables.version_range(model_id).count();
        let model_deleted = remaining == 0;
        if model_deleted {
            tables.models.remove(&model_id);
            tables.artifacts.retain(|_, a| a.model_id != model_id);
        }

        Ok(VersionDeletion {
            remaining,
            model_deleted,
        })
    }

    async fn insert_artifact(&self, artifact: &RuntimeArtifact) -> Result<()> {
        let mut tables = self.tables.write();

        if !tables.versions.contains_key(&(artifact.model_id, artifact.version)) {
            return Err(version_not_found(artifact.model_id, artifact.version));
        }
        if tables.artifacts.contains_key(&artifact.name) {
            return Err(Error::Conflict(format!("Artifact already exists: {}", artifact.name)));
        }

        tables.artifacts.insert(artifact.name.clone(), artifact.clone());

        Ok(())
    }

    async fn list_artifacts(&self, model_id: ModelId) -> Result<Vec<RuntimeArtifact>> {
        Ok(self
            .tables
            .read()
            .artifacts
            .values()
            .filter(|a| a.model_id == model_id)
            .cloned()
            .collect())
    }

    async fn list_version_artifacts(&self, model_id: ModelId, number: u32) -> Result<Vec<RuntimeArtifact>> {
        Ok(self
            .tables
            .read()
            .artifacts
            .values()
            .filter(|a| a.model_id == model_id && a.version == number)
            .cloned()
            .collect())
    }
}
