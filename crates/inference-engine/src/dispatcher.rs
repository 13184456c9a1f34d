//! Prediction dispatch
//!
//! Resolves a version's ensemble artifact, runs one batched inference call
//! against the runtime and decodes the result for the model's task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{histogram, increment_counter};
use tracing::{debug, instrument, warn};

use common::error::{Error, Result};
use common::models::{ModelId, Task};
use common::types::PredictionResult;
use common::utils::{execute_with_timeout, validate_batch};
use model_manager::ModelRegistry;

use crate::decode::decode;
use crate::postprocess::postprocess;
use crate::runtime::InferenceRuntime;

/// Runs predictions against deployed versions
pub struct InferenceDispatcher {
    /// Resolves versions to their ensemble artifacts
    registry: ModelRegistry,
    /// Serving engine
    runtime: Arc<dyn InferenceRuntime>,
    /// Bound on a single inference call
    infer_timeout: Duration,
}

impl InferenceDispatcher {
    pub fn new(registry: ModelRegistry, runtime: Arc<dyn InferenceRuntime>, infer_timeout: Duration) -> Self {
        Self {
            registry,
            runtime,
            infer_timeout,
        }
    }

    /// Predicts on a batch of raw inputs
    ///
    /// The batch is validated before any store or runtime call. A version
    /// without an ensemble artifact, or one the runtime does not serve, is
    /// `Err(Error::NotFound)`.
    #[instrument(skip(self, inputs), fields(batch = inputs.len()))]
    pub async fn predict(
        &self,
        model_id: ModelId,
        version: u32,
        task: Task,
        inputs: &[Vec<u8>],
    ) -> Result<PredictionResult> {
        validate_batch(inputs)?;

        let started = Instant::now();
        let result = self.dispatch(model_id, version, task, inputs).await;
        let elapsed = started.elapsed();

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_not_found() => "not_found",
            Err(e) if e.is_decode() => "decode_error",
            Err(e) if e.is_timeout() => "timeout",
            Err(_) => "error",
        };
        increment_counter!("model_inference_requests_total", "task" => task.to_string(), "outcome" => outcome);
        histogram!("model_inference_latency_seconds", elapsed.as_secs_f64(), "task" => task.to_string());

        if let Err(e) = &result {
            warn!(model_id, version, "Prediction failed: {}", e);
        }

        result
    }

    async fn dispatch(
        &self,
        model_id: ModelId,
        version: u32,
        task: Task,
        inputs: &[Vec<u8>],
    ) -> Result<PredictionResult> {
        let ensemble = self.registry.ensemble_artifact(model_id, version).await?;
        let name = ensemble.name.as_str();
        let runtime_version = ensemble.runtime_version_str();

        let offline = || {
            Error::NotFound(format!(
                "Model {} version {} is offline: runtime does not serve {}",
                model_id, version, name
            ))
        };
        let metadata = self
            .runtime
            .metadata(name, &runtime_version)
            .await?
            .ok_or_else(offline)?;
        let config = self
            .runtime
            .config(name, &runtime_version)
            .await?
            .ok_or_else(offline)?;

        let raw = execute_with_timeout(
            self.runtime.infer(name, &runtime_version, inputs, &metadata, &config),
            self.infer_timeout,
            "inference",
        )
        .await?;

        debug!(artifact = %name, outputs = raw.outputs.len(), "Inference returned");

        decode(postprocess(&raw, &metadata, task)?)
    }
}
