//! Inference runtime access for the model orchestrator
//!
//! This crate provides the adapter over the serving engine, the HTTP client
//! implementing it, output decoding per task and the prediction dispatcher.

pub mod decode;
pub mod dispatcher;
pub mod http;
pub mod postprocess;
pub mod runtime;
pub mod tensor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use dispatcher::InferenceDispatcher;
pub use http::HttpRuntimeClient;
pub use runtime::InferenceRuntime;
pub use tensor::{ArtifactConfig, ArtifactMetadata, OutputTensor, RawOutput, TensorSpec};
