//! In-process runtime double for tests
//!
//! Keeps a set of loaded artifact names, records every call and can be told
//! to fail or to report not-ready.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use common::error::{Error, Result};

use crate::runtime::InferenceRuntime;
use crate::tensor::{ArtifactConfig, ArtifactMetadata, RawOutput, TensorSpec};

/// A call observed by [`FakeRuntime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    IsReady,
    Load(String),
    Unload(String),
    Metadata(String, String),
    Config(String, String),
    /// Artifact, version and batch size
    Infer(String, String, usize),
}

struct FakeState {
    ready: bool,
    loaded: BTreeSet<String>,
    calls: Vec<RuntimeCall>,
    fail_load: bool,
    fail_unload: bool,
    fail_infer: bool,
    delay: Option<Duration>,
    output_names: Vec<String>,
    output: RawOutput,
}

/// Scriptable [`InferenceRuntime`]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRuntime {
    /// A ready runtime with nothing loaded
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                ready: true,
                loaded: BTreeSet::new(),
                calls: Vec::new(),
                fail_load: false,
                fail_unload: false,
                fail_infer: false,
                delay: None,
                output_names: vec!["output".to_string()],
                output: RawOutput::default(),
            }),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.lock().ready = ready;
    }

    pub fn fail_load(&self, fail: bool) {
        self.state.lock().fail_load = fail;
    }

    pub fn fail_unload(&self, fail: bool) {
        self.state.lock().fail_unload = fail;
    }

    pub fn fail_infer(&self, fail: bool) {
        self.state.lock().fail_infer = fail;
    }

    /// Delays load, unload and infer calls
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    /// Output tensor names reported in artifact metadata
    pub fn set_output_names(&self, names: &[&str]) {
        self.state.lock().output_names = names.iter().map(|n| n.to_string()).collect();
    }

    /// Response returned by every successful infer call
    pub fn set_output(&self, output: RawOutput) {
        self.state.lock().output = output;
    }

    /// Marks an artifact as loaded without recording a call
    pub fn preload(&self, name: &str) {
        self.state.lock().loaded.insert(name.to_string());
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state.lock().loaded.contains(name)
    }

    pub fn loaded(&self) -> Vec<String> {
        self.state.lock().loaded.iter().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.lock().calls.clone()
    }

    /// Number of load and unload calls
    pub fn control_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RuntimeCall::Load(_) | RuntimeCall::Unload(_)))
            .count()
    }

    pub fn infer_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RuntimeCall::Infer(..)))
            .count()
    }

    fn record(&self, call: RuntimeCall) -> Option<Duration> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state.delay
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl InferenceRuntime for FakeRuntime {
    async fn is_ready(&self) -> bool {
        self.record(RuntimeCall::IsReady);
        self.state.lock().ready
    }

    async fn load_artifact(&self, name: &str) -> Result<()> {
        let delay = self.record(RuntimeCall::Load(name.to_string()));
        Self::pause(delay).await;

        let mut state = self.state.lock();
        if state.fail_load {
            return Err(Error::Runtime(format!("failed to load '{}'", name)));
        }
        state.loaded.insert(name.to_string());
        Ok(())
    }

    async fn unload_artifact(&self, name: &str) -> Result<()> {
        let delay = self.record(RuntimeCall::Unload(name.to_string()));
        Self::pause(delay).await;

        let mut state = self.state.lock();
        if state.fail_unload {
            return Err(Error::Runtime(format!("failed to unload '{}'", name)));
        }
        state.loaded.remove(name);
        Ok(())
    }

    async fn metadata(&self, name: &str, version: &str) -> Result<Option<ArtifactMetadata>> {
        self.record(RuntimeCall::Metadata(name.to_string(), version.to_string()));

        let state = self.state.lock();
        if !state.loaded.contains(name) {
            return Ok(None);
        }

        let bytes = |name: &str| TensorSpec {
            name: name.to_string(),
            datatype: "BYTES".to_string(),
            shape: vec![-1, 1],
        };
        Ok(Some(ArtifactMetadata {
            name: name.to_string(),
            versions: vec![version.to_string()],
            platform: "ensemble".to_string(),
            inputs: vec![bytes("input")],
            outputs: state.output_names.iter().map(|n| bytes(n.as_str())).collect(),
        }))
    }

    async fn config(&self, name: &str, version: &str) -> Result<Option<ArtifactConfig>> {
        self.record(RuntimeCall::Config(name.to_string(), version.to_string()));

        if !self.state.lock().loaded.contains(name) {
            return Ok(None);
        }

        Ok(Some(ArtifactConfig {
            name: name.to_string(),
            platform: "ensemble".to_string(),
            max_batch_size: 32,
        }))
    }

    async fn infer(
        &self,
        name: &str,
        version: &str,
        inputs: &[Vec<u8>],
        _metadata: &ArtifactMetadata,
        _config: &ArtifactConfig,
    ) -> Result<RawOutput> {
        let delay = self.record(RuntimeCall::Infer(name.to_string(), version.to_string(), inputs.len()));
        Self::pause(delay).await;

        let state = self.state.lock();
        if !state.loaded.contains(name) {
            return Err(Error::Runtime(format!("Request for unknown model: '{}'", name)));
        }
        if state.fail_infer {
            return Err(Error::Runtime(format!("inference on '{}' failed", name)));
        }
        Ok(state.output.clone())
    }
}
