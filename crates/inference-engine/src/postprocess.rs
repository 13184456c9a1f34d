//! Extraction of task-shaped data from raw runtime tensors
//!
//! This is the structural step: it pulls the expected tensors out of a
//! response and reshapes them per batch item. Interpreting the values
//! happens in [`crate::decode`].

use common::error::{Error, Result};
use common::models::Task;

use crate::tensor::{ArtifactMetadata, OutputTensor, RawOutput};

/// Output tensor holding detection boxes as `[x1, y1, x2, y2, score]` rows
pub const DETECTION_BOXES: &str = "output_bboxes";
/// Output tensor holding one label per detection box
pub const DETECTION_LABELS: &str = "output_labels";

/// Values per detection box row
const BOX_WIDTH: usize = 5;

/// Raw output reshaped for a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// One `"<score>:<index>:<label>"` string per prediction
    Classification(Vec<String>),
    /// Parallel per-batch-item box rows and labels
    Detection {
        boxes: Vec<Vec<[f32; BOX_WIDTH]>>,
        labels: Vec<Vec<String>>,
    },
    /// Tensors passed through untouched
    Raw(serde_json::Value),
}

/// Reshapes a runtime response for the model's task
pub fn postprocess(raw: &RawOutput, metadata: &ArtifactMetadata, task: Task) -> Result<TaskOutput> {
    match task {
        Task::Classification => classification(raw, metadata),
        Task::Detection => detection(raw),
        Task::Unspecified => Ok(TaskOutput::Raw(serde_json::to_value(&raw.outputs)?)),
    }
}

fn required<'a>(raw: &'a RawOutput, name: &str) -> Result<&'a OutputTensor> {
    raw.output(name)
        .ok_or_else(|| Error::Decode(format!("Missing output tensor '{}'", name)))
}

fn classification(raw: &RawOutput, metadata: &ArtifactMetadata) -> Result<TaskOutput> {
    let tensor = match metadata.outputs.first() {
        Some(spec) => required(raw, &spec.name)?,
        None => raw
            .outputs
            .first()
            .ok_or_else(|| Error::Decode("Response has no output tensors".to_string()))?,
    };

    let strings = tensor
        .as_strings()
        .ok_or_else(|| Error::Decode(format!("Output '{}' is not a string tensor", tensor.name)))?;

    Ok(TaskOutput::Classification(strings))
}

fn detection(raw: &RawOutput) -> Result<TaskOutput> {
    let boxes_tensor = required(raw, DETECTION_BOXES)?;
    let labels_tensor = required(raw, DETECTION_LABELS)?;

    let flat_boxes = boxes_tensor
        .as_f32()
        .ok_or_else(|| Error::Decode(format!("Output '{}' is not numeric", DETECTION_BOXES)))?;
    let flat_labels = labels_tensor
        .as_strings()
        .ok_or_else(|| Error::Decode(format!("Output '{}' is not a string tensor", DETECTION_LABELS)))?;

    // Labels are [batch, n] or, for a single item, [n]
    let (batch, per_item) = match labels_tensor.shape.as_slice() {
        [batch, n, ..] => (dimension(*batch)?, dimension(*n)?),
        [n] => (1, dimension(*n)?),
        _ => (1, flat_labels.len()),
    };

    if batch.checked_mul(per_item) != Some(flat_labels.len())
        || flat_labels.len().checked_mul(BOX_WIDTH) != Some(flat_boxes.len())
    {
        return Err(Error::Decode(format!(
            "Detection outputs disagree: {} labels, {} box values for shape {:?}",
            flat_labels.len(),
            flat_boxes.len(),
            labels_tensor.shape
        )));
    }

    let rows: Vec<[f32; BOX_WIDTH]> = flat_boxes
        .chunks_exact(BOX_WIDTH)
        .map(|c| [c[0], c[1], c[2], c[3], c[4]])
        .collect();

    // chunks() panics on zero; an empty batch has nothing to split
    let step = per_item.max(1);
    let boxes = rows.chunks(step).map(<[_]>::to_vec).collect();
    let labels = flat_labels.chunks(step).map(<[_]>::to_vec).collect();

    Ok(TaskOutput::Detection { boxes, labels })
}

/// A concrete tensor dimension; dynamic (-1) or oversized values are rejected
fn dimension(value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::Decode(format!("Invalid dimension {} in '{}' shape", value, DETECTION_LABELS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorSpec;
    use serde_json::json;

    fn tensor(name: &str, datatype: &str, shape: Vec<i64>, data: serde_json::Value) -> OutputTensor {
        OutputTensor {
            name: name.to_string(),
            datatype: datatype.to_string(),
            shape,
            data,
        }
    }

    fn metadata(outputs: &[&str]) -> ArtifactMetadata {
        ArtifactMetadata {
            name: "m".to_string(),
            versions: vec![],
            platform: "ensemble".to_string(),
            inputs: vec![],
            outputs: outputs
                .iter()
                .map(|name| TensorSpec {
                    name: name.to_string(),
                    datatype: "BYTES".to_string(),
                    shape: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_classification_uses_declared_output() {
        let raw = RawOutput {
            outputs: vec![
                tensor("other", "FP32", vec![1], json!([1.0])),
                tensor("output", "BYTES", vec![2, 1], json!(["0.9:1:cat", "0.1:2:dog"])),
            ],
            ..Default::default()
        };

        let out = postprocess(&raw, &metadata(&["output"]), Task::Classification).unwrap();
        assert_eq!(
            out,
            TaskOutput::Classification(vec!["0.9:1:cat".to_string(), "0.1:2:dog".to_string()])
        );
    }

    #[test]
    fn test_detection_reshapes_per_item() {
        let raw = RawOutput {
            outputs: vec![
                tensor(
                    DETECTION_BOXES,
                    "FP32",
                    vec![2, 2, 5],
                    json!([0, 0, 1, 1, 0.9, -1, -1, -1, -1, -1, 2, 2, 4, 4, 0.5, -1, -1, -1, -1, -1]),
                ),
                tensor(DETECTION_LABELS, "BYTES", vec![2, 2], json!(["cat", "0", "dog", "0"])),
            ],
            ..Default::default()
        };

        match postprocess(&raw, &metadata(&[]), Task::Detection).unwrap() {
            TaskOutput::Detection { boxes, labels } => {
                assert_eq!(boxes.len(), 2);
                assert_eq!(boxes[1][0], [2.0, 2.0, 4.0, 4.0, 0.5]);
                assert_eq!(labels[1], vec!["dog".to_string(), "0".to_string()]);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_detection_shape_mismatch_is_decode_error() {
        let raw = RawOutput {
            outputs: vec![
                tensor(DETECTION_BOXES, "FP32", vec![1, 1, 5], json!([0, 0, 1, 1])),
                tensor(DETECTION_LABELS, "BYTES", vec![1, 1], json!(["cat"])),
            ],
            ..Default::default()
        };

        assert!(postprocess(&raw, &metadata(&[]), Task::Detection).unwrap_err().is_decode());
    }

    #[test]
    fn test_dynamic_dimension_is_decode_error() {
        let raw = RawOutput {
            outputs: vec![
                tensor(DETECTION_BOXES, "FP32", vec![-1, 1, 5], json!([0, 0, 1, 1, 0.9])),
                tensor(DETECTION_LABELS, "BYTES", vec![-1, 2], json!(["cat", "0"])),
            ],
            ..Default::default()
        };

        assert!(postprocess(&raw, &metadata(&[]), Task::Detection).unwrap_err().is_decode());

        let huge = RawOutput {
            outputs: vec![
                tensor(DETECTION_BOXES, "FP32", vec![1, 1, 5], json!([0, 0, 1, 1, 0.9])),
                tensor(DETECTION_LABELS, "BYTES", vec![i64::MAX, i64::MAX], json!(["cat"])),
            ],
            ..Default::default()
        };
        assert!(postprocess(&huge, &metadata(&[]), Task::Detection).unwrap_err().is_decode());
    }

    #[test]
    fn test_missing_tensor_is_decode_error() {
        let raw = RawOutput::default();
        assert!(postprocess(&raw, &metadata(&[]), Task::Detection).unwrap_err().is_decode());
        assert!(postprocess(&raw, &metadata(&[]), Task::Classification).unwrap_err().is_decode());
    }

    #[test]
    fn test_unspecified_passes_through() {
        let raw = RawOutput {
            outputs: vec![tensor("embedding", "FP32", vec![1, 2], json!([0.5, 0.25]))],
            ..Default::default()
        };

        match postprocess(&raw, &metadata(&[]), Task::Unspecified).unwrap() {
            TaskOutput::Raw(value) => assert_eq!(value[0]["data"], json!([0.5, 0.25])),
            other => panic!("unexpected output: {:?}", other),
        }
    }
}
