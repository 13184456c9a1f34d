//! Wire types exchanged with the inference runtime
//!
//! Shapes follow the KServe v2 inference protocol as served by Triton.

use serde::{Deserialize, Serialize};

/// Declared input or output of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name: String,
    pub datatype: String,
    #[serde(default)]
    pub shape: Vec<i64>,
}

/// Metadata of a loaded artifact version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub inputs: Vec<TensorSpec>,
    #[serde(default)]
    pub outputs: Vec<TensorSpec>,
}

impl ArtifactMetadata {
    /// First declared input; the entry point of an ensemble
    pub fn primary_input(&self) -> Option<&TensorSpec> {
        self.inputs.first()
    }
}

/// Subset of an artifact's runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub name: String,
    #[serde(default)]
    pub platform: String,
    /// Zero when the artifact does not batch
    #[serde(default)]
    pub max_batch_size: u32,
}

/// One tensor of an inference response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTensor {
    pub name: String,
    pub datatype: String,
    #[serde(default)]
    pub shape: Vec<i64>,
    /// Flattened row-major contents
    #[serde(default)]
    pub data: serde_json::Value,
}

impl OutputTensor {
    /// Contents as strings, for `BYTES` tensors
    pub fn as_strings(&self) -> Option<Vec<String>> {
        self.data
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Contents as floats, for numeric tensors
    pub fn as_f32(&self) -> Option<Vec<f32>> {
        self.data
            .as_array()?
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }
}

/// Undecoded inference response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub model_version: String,
    #[serde(default)]
    pub outputs: Vec<OutputTensor>,
}

impl RawOutput {
    /// Looks up an output tensor by name
    pub fn output(&self, name: &str) -> Option<&OutputTensor> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_from_runtime_json() {
        let metadata: ArtifactMetadata = serde_json::from_value(json!({
            "name": "local-user#resnet#ensemble#1",
            "versions": ["1"],
            "platform": "ensemble",
            "inputs": [{"name": "input", "datatype": "BYTES", "shape": [-1, 1]}],
            "outputs": [{"name": "output", "datatype": "BYTES", "shape": [-1, 1]}]
        }))
        .unwrap();

        assert_eq!(metadata.primary_input().map(|i| i.name.as_str()), Some("input"));
        assert_eq!(metadata.outputs[0].shape, vec![-1, 1]);
    }

    #[test]
    fn test_output_accessors() {
        let strings = OutputTensor {
            name: "output".to_string(),
            datatype: "BYTES".to_string(),
            shape: vec![2, 1],
            data: json!(["0.9:1:cat", "0.8:2:dog"]),
        };
        assert_eq!(strings.as_strings().unwrap().len(), 2);
        assert!(strings.as_f32().is_none());

        let floats = OutputTensor {
            name: "output_bboxes".to_string(),
            datatype: "FP32".to_string(),
            shape: vec![1, 1, 5],
            data: json!([1.0, 2.0, 3.0, 4.0, 0.5]),
        };
        assert_eq!(floats.as_f32().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 0.5]);
    }
}
