//! Orchestrator facade
//!
//! Composes the registry, the artifact store, the version lifecycle and the
//! inference dispatcher into the model service verbs. The metadata store is
//! authoritative: deletes succeed once their metadata is gone, with runtime
//! and file cleanup reported through [`CleanupResult`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use common::cleanup::{CleanupResult, CleanupStage};
use common::error::{Error, Result};
use common::models::{Model, ModelId, ModelInfo, NewModel, NewVersion, RuntimeArtifact, VersionPatch, VersionStatus};
use common::types::PredictionResult;
use common::utils::{validate_batch, validate_model_name};
use inference_engine::{InferenceDispatcher, InferenceRuntime};
use model_manager::ModelRegistry;
use storage_adapter::{ArtifactStore, PackagedArtifact};

use crate::lifecycle::VersionLifecycle;
use crate::metrics::record_cleanup;
use crate::service::{ModelService, ModelUpdate, UploadRequest};
use crate::state::TargetStatus;

/// Timeouts applied to runtime calls
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    /// Load, unload, metadata, config and readiness calls
    pub control_timeout: Duration,
    /// Inference calls
    pub infer_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            control_timeout: Duration::from_secs(60),
            infer_timeout: Duration::from_secs(30),
        }
    }
}

/// The model lifecycle control plane
pub struct Orchestrator {
    /// Metadata source of truth
    registry: ModelRegistry,
    /// On-disk artifacts shared with the runtime
    artifacts: ArtifactStore,
    /// Serving engine
    runtime: Arc<dyn InferenceRuntime>,
    /// Status transitions
    lifecycle: VersionLifecycle,
    /// Predictions
    dispatcher: InferenceDispatcher,
}

impl Orchestrator {
    pub fn new(
        registry: ModelRegistry,
        artifacts: ArtifactStore,
        runtime: Arc<dyn InferenceRuntime>,
        options: OrchestratorOptions,
    ) -> Self {
        let lifecycle = VersionLifecycle::new(registry.clone(), runtime.clone(), options.control_timeout);
        let dispatcher = InferenceDispatcher::new(registry.clone(), runtime.clone(), options.infer_timeout);

        Self {
            registry,
            artifacts,
            runtime,
            lifecycle,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn lifecycle(&self) -> &VersionLifecycle {
        &self.lifecycle
    }

    /// Finds the model to upload into, creating it if absent
    ///
    /// Returns whether the model was created by this call.
    async fn upload_target(&self, request: &UploadRequest) -> Result<(Model, bool)> {
        match self.registry.get_model_by_name(&request.namespace, &request.name).await {
            Ok(model) => {
                if model.task != request.task {
                    return Err(Error::Validation(format!(
                        "Model {} is a {} model, upload declares {}",
                        model.name, model.task, request.task
                    )));
                }
                Ok((model, false))
            }
            Err(e) if e.is_not_found() => {
                let spec = NewModel {
                    namespace: request.namespace.clone(),
                    name: request.name.clone(),
                    task: request.task,
                };
                match self.registry.create_model(spec).await {
                    Ok(model) => Ok((model, true)),
                    // Lost a race with a concurrent upload of the same name
                    Err(e) if e.is_conflict() => {
                        let model = self.registry.get_model_by_name(&request.namespace, &request.name).await?;
                        Ok((model, false))
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Writes files and registers artifacts of a new version
    async fn persist_version(&self, model_id: ModelId, version: u32, named: &[PackagedArtifact]) -> Result<()> {
        self.artifacts.put_version(model_id, version, named).await?;

        for artifact in named {
            self.registry
                .register_artifact(RuntimeArtifact {
                    name: artifact.name.clone(),
                    model_id,
                    version,
                    runtime_version: artifact.runtime_version,
                    ensemble: artifact.ensemble,
                })
                .await?;
        }

        Ok(())
    }

    /// Undoes a failed upload: files, then the version (and with it a model
    /// left without versions)
    async fn rollback_upload(&self, model_id: ModelId, version: u32, named: &[PackagedArtifact]) {
        let mut cleanup = CleanupResult::new();

        for artifact in named {
            cleanup.check(
                CleanupStage::RemoveFiles,
                &artifact.name,
                self.artifacts.remove(&artifact.name).await,
            );
        }

        match self.registry.delete_version(model_id, version).await {
            Ok(deletion) if deletion.model_deleted => info!(model_id, "Rolled back upload and its new model"),
            Ok(_) => info!(model_id, version, "Rolled back upload"),
            Err(e) => error!(model_id, version, "Failed to roll back version metadata: {}", e),
        }

        cleanup.log("rollback_upload");
        record_cleanup(&cleanup);
    }

    async fn resolve_version(&self, model_id: ModelId, version: Option<u32>) -> Result<u32> {
        match version {
            Some(number) => Ok(self.registry.get_version(model_id, number).await?.number),
            None => Ok(self.registry.get_latest_version(model_id).await?.number),
        }
    }

    async fn remove_files(&self, artifacts: Result<Vec<RuntimeArtifact>>, owner: &str, cleanup: &mut CleanupResult) {
        match artifacts {
            Ok(artifacts) => {
                for artifact in artifacts {
                    cleanup.check(
                        CleanupStage::RemoveFiles,
                        &artifact.name,
                        self.artifacts.remove(&artifact.name).await,
                    );
                }
            }
            Err(e) => cleanup.record(CleanupStage::Lookup, owner, e),
        }
    }
}

#[async_trait]
impl ModelService for Orchestrator {
    #[instrument(skip(self, request), fields(namespace = %request.namespace, name = %request.name))]
    async fn create_model_by_upload(&self, request: UploadRequest) -> Result<ModelInfo> {
        validate_model_name(&request.name)?;

        let (model, created) = self.upload_target(&request).await?;

        let new_version = NewVersion {
            description: request.description.clone(),
            status: VersionStatus::Offline,
        };
        let version = match self.registry.create_version(model.id, new_version).await {
            Ok(version) => version,
            Err(e) => {
                if created {
                    if let Err(cleanup) = self.registry.delete_model(model.id).await {
                        error!(model_id = model.id, "Failed to remove model after failed upload: {}", cleanup);
                    }
                }
                return Err(e);
            }
        };

        let named = request.package.into_named(&model.namespace, &model.name, version.number);
        if let Err(e) = self.persist_version(model.id, version.number, &named).await {
            warn!(model_id = model.id, version = version.number, "Upload failed, rolling back: {}", e);
            self.rollback_upload(model.id, version.number, &named).await;
            return Err(e);
        }

        info!(
            model_id = model.id,
            version = version.number,
            artifacts = named.len(),
            "Stored upload"
        );

        if request.online {
            self.lifecycle
                .request_status(model.id, version.number, TargetStatus::Online)
                .await?;
        }

        self.registry.model_info(model.id).await
    }

    #[instrument(skip(self))]
    async fn list_models(&self, namespace: &str) -> Result<Vec<ModelInfo>> {
        if !self.runtime.is_ready().await {
            return Err(Error::RuntimeUnavailable("Inference runtime not ready yet".to_string()));
        }

        let models = self.registry.list_models(namespace).await?;
        let mut infos = Vec::with_capacity(models.len());
        for model in models {
            match self.registry.model_info(model.id).await {
                Ok(info) => infos.push(info),
                // Deleted since the listing
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(infos)
    }

    #[instrument(skip(self))]
    async fn get_model(&self, namespace: &str, name: &str) -> Result<ModelInfo> {
        let model = self.registry.get_model_by_name(namespace, name).await?;
        self.registry.model_info(model.id).await
    }

    #[instrument(skip(self, update))]
    async fn update_model(
        &self,
        namespace: &str,
        name: &str,
        version: Option<u32>,
        update: ModelUpdate,
    ) -> Result<ModelInfo> {
        // Reject bad input before touching anything
        let target = update
            .status
            .as_deref()
            .map(str::parse::<TargetStatus>)
            .transpose()?;
        if target.is_none() && update.description.is_none() {
            return Err(Error::Validation("Nothing to update: set status or description".to_string()));
        }

        let model = self.registry.get_model_by_name(namespace, name).await?;
        let number = self.resolve_version(model.id, version).await?;

        if let Some(description) = update.description {
            self.registry
                .update_version(model.id, number, VersionPatch::description(description))
                .await?;
        }
        if let Some(target) = target {
            self.lifecycle.request_status(model.id, number, target).await?;
        }

        self.registry.model_info(model.id).await
    }

    #[instrument(skip(self))]
    async fn delete_model(&self, namespace: &str, name: &str) -> Result<CleanupResult> {
        let model = self.registry.get_model_by_name(namespace, name).await?;
        let versions = self.registry.list_versions(model.id).await?;
        let mut cleanup = CleanupResult::new();

        // Ascending order keeps lock acquisition consistent across deletes
        let mut guards = Vec::with_capacity(versions.len());
        for version in &versions {
            guards.push(self.lifecycle.lock(model.id, version.number).await);
            self.lifecycle
                .release_locked(model.id, version.number, &mut cleanup)
                .await;
        }

        let owner = format!("model {}", model.id);
        self.remove_files(self.registry.artifacts(model.id).await, &owner, &mut cleanup)
            .await;

        self.registry.delete_model(model.id).await?;

        drop(guards);
        for version in &versions {
            self.lifecycle.forget(model.id, version.number);
        }

        cleanup.log("delete_model");
        record_cleanup(&cleanup);
        info!(
            model_id = model.id,
            versions = versions.len(),
            cleanup_failures = cleanup.failures().len(),
            "Deleted model"
        );

        Ok(cleanup)
    }

    #[instrument(skip(self))]
    async fn delete_model_version(&self, namespace: &str, name: &str, version: u32) -> Result<CleanupResult> {
        let model = self.registry.get_model_by_name(namespace, name).await?;
        self.registry.get_version(model.id, version).await?;
        let mut cleanup = CleanupResult::new();

        let guard = self.lifecycle.lock(model.id, version).await;
        self.lifecycle.release_locked(model.id, version, &mut cleanup).await;

        let owner = format!("model {} version {}", model.id, version);
        self.remove_files(
            self.registry.version_artifacts(model.id, version).await,
            &owner,
            &mut cleanup,
        )
        .await;

        let deletion = self.registry.delete_version(model.id, version).await?;

        drop(guard);
        self.lifecycle.forget(model.id, version);

        cleanup.log("delete_model_version");
        record_cleanup(&cleanup);
        info!(
            model_id = model.id,
            version,
            model_deleted = deletion.model_deleted,
            cleanup_failures = cleanup.failures().len(),
            "Deleted model version"
        );

        Ok(cleanup)
    }

    #[instrument(skip(self, inputs), fields(batch = inputs.len()))]
    async fn predict(
        &self,
        namespace: &str,
        name: &str,
        version: Option<u32>,
        inputs: Vec<Vec<u8>>,
    ) -> Result<PredictionResult> {
        // Bad batches never reach the store
        validate_batch(&inputs)?;

        let model = self.registry.get_model_by_name(namespace, name).await?;
        let number = self.resolve_version(model.id, version).await?;

        self.dispatcher.predict(model.id, number, model.task, &inputs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Task;
    use inference_engine::testing::FakeRuntime;
    use inference_engine::{OutputTensor, RawOutput};
    use model_manager::InMemoryStore;
    use storage_adapter::{ArtifactFile, UploadPackage};

    const NS: &str = "users/local-user";

    struct Fixture {
        _root: tempfile::TempDir,
        artifacts: ArtifactStore,
        runtime: Arc<FakeRuntime>,
        orchestrator: Arc<Orchestrator>,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let artifacts = ArtifactStore::new(root.path().join("model-store")).unwrap();
        let runtime = Arc::new(FakeRuntime::new());
        let orchestrator = Arc::new(Orchestrator::new(
            ModelRegistry::new(Arc::new(InMemoryStore::new())),
            artifacts.clone(),
            runtime.clone(),
            OrchestratorOptions::default(),
        ));

        Fixture {
            _root: root,
            artifacts,
            runtime,
            orchestrator,
        }
    }

    fn component(name: &str, ensemble: bool) -> PackagedArtifact {
        let config = if ensemble {
            format!("name: \"{}\"\nplatform: \"ensemble\"\n", name)
        } else {
            format!("name: \"{}\"\nplatform: \"onnxruntime_onnx\"\n", name)
        };
        PackagedArtifact {
            name: name.to_string(),
            ensemble,
            runtime_version: 1,
            files: vec![
                ArtifactFile::new("config.pbtxt", config),
                ArtifactFile::new("1/model.bin", vec![0u8; 8]),
            ],
        }
    }

    fn package() -> UploadPackage {
        UploadPackage::new(vec![component("ensemble", true), component("infer", false)]).unwrap()
    }

    fn upload(name: &str, task: Task, online: bool) -> UploadRequest {
        UploadRequest {
            namespace: NS.to_string(),
            name: name.to_string(),
            task,
            description: "first upload".to_string(),
            package: package(),
            online,
        }
    }

    fn classification_output() -> RawOutput {
        RawOutput {
            outputs: vec![OutputTensor {
                name: "output".to_string(),
                datatype: "BYTES".to_string(),
                shape: vec![1, 1],
                data: serde_json::json!(["0.8:4:zebra"]),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upload_creates_offline_version_with_artifacts() {
        let f = fixture();

        let info = f
            .orchestrator
            .create_model_by_upload(upload("zebra", Task::Classification, false))
            .await
            .unwrap();

        assert_eq!(info.model.name, "zebra");
        assert_eq!(info.versions.len(), 1);
        assert_eq!(info.versions[0].status, VersionStatus::Offline);
        assert_eq!(info.versions[0].description, "first upload");
        assert_eq!(info.artifacts.len(), 2);
        assert!(f.artifacts.exists("local-user#zebra#ensemble#1").await);
        assert!(f.artifacts.exists("local-user#zebra#infer#1").await);
        assert!(f.runtime.loaded().is_empty());
    }

    #[tokio::test]
    async fn test_second_upload_adds_version() {
        let f = fixture();
        f.orchestrator
            .create_model_by_upload(upload("zebra", Task::Classification, false))
            .await
            .unwrap();

        let info = f
            .orchestrator
            .create_model_by_upload(upload("zebra", Task::Classification, false))
            .await
            .unwrap();
        assert_eq!(info.latest_version().map(|v| v.number), Some(2));
        assert!(f.artifacts.exists("local-user#zebra#ensemble#2").await);

        let err = f
            .orchestrator
            .create_model_by_upload(upload("zebra", Task::Detection, false))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_invalid_name_creates_nothing() {
        let f = fixture();

        let err = f
            .orchestrator
            .create_model_by_upload(upload("-bad", Task::Classification, false))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(f.orchestrator.registry().list_models(NS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_store_rolls_back_new_model() {
        let f = fixture();
        let mut request = upload("broken", Task::Classification, false);
        request.package = UploadPackage::new(vec![component("ensemble", true), component("bad/part", false)]).unwrap();

        assert!(f.orchestrator.create_model_by_upload(request).await.is_err());

        let err = f.orchestrator.get_model(NS, "broken").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!f.artifacts.exists("local-user#broken#ensemble#1").await);
    }

    #[tokio::test]
    async fn test_failed_store_keeps_existing_model() {
        let f = fixture();
        f.orchestrator
            .create_model_by_upload(upload("kept", Task::Classification, false))
            .await
            .unwrap();

        let mut request = upload("kept", Task::Classification, false);
        request.package = UploadPackage::new(vec![component("ensemble", true), component("bad/part", false)]).unwrap();
        assert!(f.orchestrator.create_model_by_upload(request).await.is_err());

        let info = f.orchestrator.get_model(NS, "kept").await.unwrap();
        assert_eq!(info.versions.len(), 1);

        // The failed upload's number is burnt
        let info = f
            .orchestrator
            .create_model_by_upload(upload("kept", Task::Classification, false))
            .await
            .unwrap();
        assert_eq!(info.latest_version().map(|v| v.number), Some(3));
    }

    #[tokio::test]
    async fn test_upload_online() {
        let f = fixture();

        let info = f
            .orchestrator
            .create_model_by_upload(upload("live", Task::Classification, true))
            .await
            .unwrap();
        assert_eq!(info.versions[0].status, VersionStatus::Online);
        assert!(f.runtime.is_loaded("local-user#live#ensemble#1"));
    }

    #[tokio::test]
    async fn test_upload_online_failure_leaves_error_version() {
        let f = fixture();
        f.runtime.fail_load(true);

        let err = f
            .orchestrator
            .create_model_by_upload(upload("live", Task::Classification, true))
            .await
            .unwrap_err();
        assert!(err.is_transition_failed());

        let info = f.orchestrator.get_model(NS, "live").await.unwrap();
        assert_eq!(info.versions[0].status, VersionStatus::Error);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_get_distinct_versions() {
        let f = fixture();

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let orchestrator = f.orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .create_model_by_upload(upload("race", Task::Classification, false))
                        .await
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        let info = f.orchestrator.get_model(NS, "race").await.unwrap();
        let mut numbers: Vec<u32> = info.versions.iter().map(|v| v.number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_list_requires_ready_runtime() {
        let f = fixture();
        f.orchestrator
            .create_model_by_upload(upload("a", Task::Classification, false))
            .await
            .unwrap();
        f.orchestrator
            .create_model_by_upload(upload("b", Task::Detection, false))
            .await
            .unwrap();

        let listed = f.orchestrator.list_models(NS).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(f.orchestrator.list_models("users/other").await.unwrap().is_empty());

        f.runtime.set_ready(false);
        let err = f.orchestrator.list_models(NS).await.unwrap_err();
        assert!(err.is_runtime_unavailable());
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_status_without_changes() {
        let f = fixture();
        f.orchestrator
            .create_model_by_upload(upload("m", Task::Classification, false))
            .await
            .unwrap();

        let update = ModelUpdate {
            status: Some("ERROR".to_string()),
            description: Some("changed".to_string()),
        };
        let err = f.orchestrator.update_model(NS, "m", Some(1), update).await.unwrap_err();
        assert!(err.is_validation());

        let info = f.orchestrator.get_model(NS, "m").await.unwrap();
        assert_eq!(info.versions[0].description, "first upload");
        assert_eq!(f.runtime.control_calls(), 0);

        let err = f
            .orchestrator
            .update_model(NS, "m", Some(1), ModelUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_update_status_and_description() {
        let f = fixture();
        f.orchestrator
            .create_model_by_upload(upload("m", Task::Classification, false))
            .await
            .unwrap();

        let info = f
            .orchestrator
            .update_model(
                NS,
                "m",
                None,
                ModelUpdate {
                    status: Some("ONLINE".to_string()),
                    description: Some("serving".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(info.versions[0].status, VersionStatus::Online);
        assert_eq!(info.versions[0].description, "serving");

        let info = f
            .orchestrator
            .update_model(
                NS,
                "m",
                Some(1),
                ModelUpdate {
                    status: Some("OFFLINE".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(info.versions[0].status, VersionStatus::Offline);
        assert!(f.runtime.loaded().is_empty());

        let err = f
            .orchestrator
            .update_model(
                NS,
                "m",
                Some(5),
                ModelUpdate {
                    status: None,
                    description: Some("x".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_model_survives_cleanup_failures() {
        let f = fixture();
        f.orchestrator
            .create_model_by_upload(upload("m", Task::Classification, true))
            .await
            .unwrap();
        f.orchestrator
            .create_model_by_upload(upload("m", Task::Classification, false))
            .await
            .unwrap();
        f.runtime.fail_unload(true);

        let cleanup = f.orchestrator.delete_model(NS, "m").await.unwrap();

        assert!(!cleanup.is_clean());
        assert!(cleanup.failures().iter().all(|c| c.stage == CleanupStage::Unload));
        assert!(f.orchestrator.get_model(NS, "m").await.unwrap_err().is_not_found());
        assert!(!f.artifacts.exists("local-user#m#ensemble#1").await);
        assert!(!f.artifacts.exists("local-user#m#infer#2").await);

        let err = f.orchestrator.delete_model(NS, "m").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_version() {
        let f = fixture();
        for _ in 0..2 {
            f.orchestrator
                .create_model_by_upload(upload("m", Task::Classification, true))
                .await
                .unwrap();
        }

        let cleanup = f.orchestrator.delete_model_version(NS, "m", 1).await.unwrap();
        assert!(cleanup.is_clean());
        assert!(!f.runtime.is_loaded("local-user#m#ensemble#1"));
        assert!(f.runtime.is_loaded("local-user#m#ensemble#2"));
        assert!(!f.artifacts.exists("local-user#m#ensemble#1").await);
        assert!(f.artifacts.exists("local-user#m#ensemble#2").await);

        let info = f.orchestrator.get_model(NS, "m").await.unwrap();
        assert_eq!(info.versions.len(), 1);
        assert_eq!(info.artifacts.len(), 2);

        assert!(f
            .orchestrator
            .delete_model_version(NS, "m", 1)
            .await
            .unwrap_err()
            .is_not_found());

        // Last version takes the model with it
        f.orchestrator.delete_model_version(NS, "m", 2).await.unwrap();
        assert!(f.orchestrator.get_model(NS, "m").await.unwrap_err().is_not_found());
        assert!(f.runtime.loaded().is_empty());
    }

    #[tokio::test]
    async fn test_predict_validates_batch_before_lookup() {
        let f = fixture();

        let err = f
            .orchestrator
            .predict(NS, "missing", None, vec![b"x".to_vec(); 33])
            .await
            .unwrap_err();
        assert!(err.is_validation(), "oversized batch gave {}", err);

        let err = f.orchestrator.predict(NS, "missing", None, Vec::new()).await.unwrap_err();
        assert!(err.is_validation(), "empty batch gave {}", err);
        assert!(f.runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_predict() {
        let f = fixture();
        f.runtime.set_output(classification_output());
        f.orchestrator
            .create_model_by_upload(upload("zebra", Task::Classification, false))
            .await
            .unwrap();

        let err = f
            .orchestrator
            .predict(NS, "zebra", None, vec![b"img".to_vec()])
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "offline version gave {}", err);

        f.orchestrator
            .update_model(NS, "zebra", None, ModelUpdate {
                status: Some("ONLINE".to_string()),
                description: None,
            })
            .await
            .unwrap();

        let result = f
            .orchestrator
            .predict(NS, "zebra", Some(1), vec![b"img".to_vec()])
            .await
            .unwrap();
        match result {
            PredictionResult::Classification(scores) => assert_eq!(scores[0].category, "zebra"),
            other => panic!("unexpected result: {:?}", other),
        }

        let err = f
            .orchestrator
            .predict(NS, "zebra", None, vec![b"x".to_vec(); 33])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.runtime.infer_calls(), 1);
    }
}
