//! Version lifecycle
//!
//! OFFLINE/ERROR --online--> ONLINE and ONLINE/ERROR --offline--> OFFLINE,
//! with any failed runtime call forcing ERROR. Transitions of one version
//! are serialised by a per-version lock held for the duration of a single
//! runtime call, itself bounded by the control timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, instrument, warn};

use common::cleanup::{CleanupResult, CleanupStage};
use common::error::{Error, Result};
use common::models::{ModelId, Version, VersionPatch, VersionStatus};
use common::utils::execute_with_timeout;
use inference_engine::InferenceRuntime;
use model_manager::ModelRegistry;

use crate::locks::KeyedLocks;
use crate::metrics::record_transition;
use crate::state::TargetStatus;

type VersionKey = (ModelId, u32);

/// State machine driving a version's runtime deployment
pub struct VersionLifecycle {
    /// Metadata source of truth
    registry: ModelRegistry,
    /// Serving engine
    runtime: Arc<dyn InferenceRuntime>,
    /// One lock per (model, version)
    locks: KeyedLocks<VersionKey>,
    /// Bound on each load/unload call
    control_timeout: Duration,
}

impl VersionLifecycle {
    pub fn new(registry: ModelRegistry, runtime: Arc<dyn InferenceRuntime>, control_timeout: Duration) -> Self {
        Self {
            registry,
            runtime,
            locks: KeyedLocks::new(),
            control_timeout,
        }
    }

    /// Holds off transitions of a version until the guard is dropped
    pub async fn lock(&self, model_id: ModelId, version: u32) -> OwnedMutexGuard<()> {
        self.locks.lock((model_id, version)).await
    }

    /// Drops the lock entry of a deleted version
    pub fn forget(&self, model_id: ModelId, version: u32) {
        self.locks.forget(&(model_id, version));
    }

    /// Moves a version toward `target`
    ///
    /// The ensemble binding is read fresh and the runtime call is always
    /// issued, even if the stored status already matches. On failure the
    /// version is marked ERROR and `Err(Error::TransitionFailed)` is returned;
    /// if that write fails too the result is `Err(Error::StatusWriteFailed)`.
    #[instrument(skip(self))]
    pub async fn request_status(&self, model_id: ModelId, version: u32, target: TargetStatus) -> Result<Version> {
        let _guard = self.lock(model_id, version).await;
        self.transition_locked(model_id, version, target).await
    }

    async fn transition_locked(&self, model_id: ModelId, version: u32, target: TargetStatus) -> Result<Version> {
        let current = self.registry.get_version(model_id, version).await?;
        let ensemble = self.registry.ensemble_artifact(model_id, version).await?;

        info!(
            model_id,
            version,
            from = %current.status,
            to = %target,
            artifact = %ensemble.name,
            "Requesting status transition"
        );

        let call = match target {
            TargetStatus::Online => {
                execute_with_timeout(self.runtime.load_artifact(&ensemble.name), self.control_timeout, "load").await
            }
            TargetStatus::Offline => {
                execute_with_timeout(self.runtime.unload_artifact(&ensemble.name), self.control_timeout, "unload")
                    .await
            }
        };

        match call {
            Ok(()) => {
                let updated = self
                    .registry
                    .update_version(model_id, version, VersionPatch::status(target.settled()))
                    .await?;
                record_transition(target, true);
                info!(model_id, version, status = %updated.status, "Transition complete");
                Ok(updated)
            }
            Err(cause) => {
                record_transition(target, false);
                warn!(model_id, version, to = %target, "Transition failed, marking ERROR: {}", cause);

                if let Err(write) = self
                    .registry
                    .update_version(model_id, version, VersionPatch::status(VersionStatus::Error))
                    .await
                {
                    error!(model_id, version, "Failed to record ERROR status: {}", write);
                    return Err(Error::StatusWriteFailed {
                        model_id,
                        version,
                        message: format!("transition error: {}; status write error: {}", cause, write),
                    });
                }

                Err(Error::TransitionFailed {
                    model_id,
                    version,
                    target: target.to_string(),
                    source: Box::new(cause),
                })
            }
        }
    }

    /// Best-effort unload of a version's ensemble, for deletes
    ///
    /// The caller must hold the version's lock. Failures are recorded in
    /// `cleanup` instead of being returned.
    pub async fn release_locked(&self, model_id: ModelId, version: u32, cleanup: &mut CleanupResult) {
        let ensemble = match self.registry.ensemble_artifact(model_id, version).await {
            Ok(ensemble) => ensemble,
            // Nothing was ever registered, so nothing can be loaded
            Err(e) if e.is_not_found() => return,
            Err(e) => {
                cleanup.record(CleanupStage::Lookup, format!("model {} version {}", model_id, version), e);
                return;
            }
        };

        let unload = execute_with_timeout(
            self.runtime.unload_artifact(&ensemble.name),
            self.control_timeout,
            "unload",
        )
        .await;
        cleanup.check(CleanupStage::Unload, &ensemble.name, unload);
    }
}
