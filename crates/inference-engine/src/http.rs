//! HTTP runtime client
//!
//! Speaks the KServe v2 REST protocol with Triton's repository and binary
//! tensor extensions. Raw inputs travel as one `BYTES` tensor in the binary
//! section of the request; outputs are requested as JSON.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use common::error::{Error, Result};

use crate::runtime::InferenceRuntime;
use crate::tensor::{ArtifactConfig, ArtifactMetadata, RawOutput};

/// Header carrying the length of the JSON part of a binary inference request
const INFERENCE_HEADER_LENGTH: &str = "Inference-Header-Content-Length";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a remote inference runtime
#[derive(Debug, Clone)]
pub struct HttpRuntimeClient {
    /// HTTP client
    client: Client,
    /// Runtime base URL
    base: Url,
    /// Bound on readiness, load, unload, metadata and config calls
    control_timeout: Duration,
    /// Bound on inference calls
    infer_timeout: Duration,
}

impl HttpRuntimeClient {
    /// Creates a client for the runtime at `url`
    pub fn new(url: &str, control_timeout: Duration, infer_timeout: Duration) -> Result<Self> {
        let base = Url::parse(url).map_err(|e| Error::Config(format!("Invalid runtime URL '{}': {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("Runtime URL cannot be a base: {}", url)));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            control_timeout,
            infer_timeout,
        })
    }

    /// Joins path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn model_endpoint(&self, name: &str, version: &str, tail: Option<&str>) -> Url {
        let mut segments = vec!["v2", "models", name, "versions", version];
        segments.extend(tail);
        self.endpoint(&segments)
    }

    fn repository_endpoint(&self, name: &str, action: &str) -> Url {
        self.endpoint(&["v2", "repository", "models", name, action])
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("{} timed out", what))
            } else {
                Error::Runtime(format!("{} failed: {}", what, e))
            }
        })
    }

    /// Turns a non-success response into an error carrying the runtime's message
    async fn failure(response: Response, what: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);

        Error::Runtime(format!("{} returned {}: {}", what, status, message))
    }

    fn unknown_artifact(status: StatusCode) -> bool {
        // Triton answers 400 for models it has never heard of
        status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST
    }

    /// Builds the binary-extension body: JSON header followed by
    /// length-prefixed input elements
    fn encode_infer_request(
        inputs: &[Vec<u8>],
        metadata: &ArtifactMetadata,
        config: &ArtifactConfig,
    ) -> Result<(Bytes, usize)> {
        let input = metadata.primary_input().ok_or_else(|| {
            Error::Runtime(format!("Artifact {} declares no inputs", metadata.name))
        })?;

        let mut binary = BytesMut::with_capacity(inputs.iter().map(|i| i.len() + 4).sum());
        for item in inputs {
            binary.put_u32_le(item.len() as u32);
            binary.put_slice(item);
        }

        let batch = inputs.len() as i64;
        let shape = if config.max_batch_size > 0 {
            vec![batch, 1]
        } else {
            vec![batch]
        };
        let outputs: Vec<_> = metadata
            .outputs
            .iter()
            .map(|o| json!({ "name": o.name, "parameters": { "binary_data": false } }))
            .collect();

        let header = serde_json::to_vec(&json!({
            "inputs": [{
                "name": input.name,
                "shape": shape,
                "datatype": "BYTES",
                "parameters": { "binary_data_size": binary.len() }
            }],
            "outputs": outputs,
        }))?;

        let header_len = header.len();
        let mut body = BytesMut::with_capacity(header_len + binary.len());
        body.put_slice(&header);
        body.put_slice(&binary);

        Ok((body.freeze(), header_len))
    }
}

#[async_trait]
impl InferenceRuntime for HttpRuntimeClient {
    async fn is_ready(&self) -> bool {
        let request = self
            .client
            .get(self.endpoint(&["v2", "health", "ready"]))
            .timeout(self.control_timeout);

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Runtime readiness probe failed: {}", e);
                false
            }
        }
    }

    async fn load_artifact(&self, name: &str) -> Result<()> {
        let what = format!("Load of {}", name);
        let request = self
            .client
            .post(self.repository_endpoint(name, "load"))
            .timeout(self.control_timeout);
        let response = self.send(request, &what).await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, &what).await);
        }

        info!(artifact = %name, "Loaded artifact in runtime");
        Ok(())
    }

    async fn unload_artifact(&self, name: &str) -> Result<()> {
        let what = format!("Unload of {}", name);
        let request = self
            .client
            .post(self.repository_endpoint(name, "unload"))
            .timeout(self.control_timeout);
        let response = self.send(request, &what).await?;

        if Self::unknown_artifact(response.status()) {
            debug!(artifact = %name, "Artifact already absent from runtime");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::failure(response, &what).await);
        }

        info!(artifact = %name, "Unloaded artifact from runtime");
        Ok(())
    }

    async fn metadata(&self, name: &str, version: &str) -> Result<Option<ArtifactMetadata>> {
        let what = format!("Metadata of {} version {}", name, version);
        let request = self
            .client
            .get(self.model_endpoint(name, version, None))
            .timeout(self.control_timeout);
        let response = self.send(request, &what).await?;

        if Self::unknown_artifact(response.status()) {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::failure(response, &what).await);
        }

        let metadata = response
            .json()
            .await
            .map_err(|e| Error::Runtime(format!("{}: malformed response: {}", what, e)))?;
        Ok(Some(metadata))
    }

    async fn config(&self, name: &str, version: &str) -> Result<Option<ArtifactConfig>> {
        let what = format!("Config of {} version {}", name, version);
        let request = self
            .client
            .get(self.model_endpoint(name, version, Some("config")))
            .timeout(self.control_timeout);
        let response = self.send(request, &what).await?;

        if Self::unknown_artifact(response.status()) {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::failure(response, &what).await);
        }

        let config = response
            .json()
            .await
            .map_err(|e| Error::Runtime(format!("{}: malformed response: {}", what, e)))?;
        Ok(Some(config))
    }

    async fn infer(
        &self,
        name: &str,
        version: &str,
        inputs: &[Vec<u8>],
        metadata: &ArtifactMetadata,
        config: &ArtifactConfig,
    ) -> Result<RawOutput> {
        let what = format!("Inference on {} version {}", name, version);
        let (body, header_len) = Self::encode_infer_request(inputs, metadata, config)?;

        let request = self
            .client
            .post(self.model_endpoint(name, version, Some("infer")))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(INFERENCE_HEADER_LENGTH, header_len)
            .body(body)
            .timeout(self.infer_timeout);
        let response = self.send(request, &what).await?;

        if !response.status().is_success() {
            let err = Self::failure(response, &what).await;
            warn!(artifact = %name, version, "{}", err);
            return Err(err);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Runtime(format!("{}: malformed response: {}", what, e)))
    }
}
