//! Decoding of post-processed runtime output into prediction results

use common::error::{Error, Result};
use common::types::{BoundingBox, BoundingBoxPrediction, ClassificationOutput, DetectionOutput, PredictionResult};

use crate::postprocess::TaskOutput;

/// Label the runtime uses for padding boxes that equalise batch shapes
pub const SENTINEL_LABEL: &str = "0";

/// Decodes a task output into a prediction result
pub fn decode(output: TaskOutput) -> Result<PredictionResult> {
    match output {
        TaskOutput::Classification(entries) => decode_classification(&entries).map(PredictionResult::Classification),
        TaskOutput::Detection { boxes, labels } => {
            decode_detection(&boxes, &labels).map(PredictionResult::Detection)
        }
        TaskOutput::Raw(value) => Ok(PredictionResult::Raw(value)),
    }
}

/// Parses `"<score>:<index>:<label>"` entries
///
/// Any malformed entry fails the whole call; no partial list is returned.
pub fn decode_classification(entries: &[String]) -> Result<Vec<ClassificationOutput>> {
    entries
        .iter()
        .map(|entry| {
            let fields: Vec<&str> = entry.split(':').collect();
            let [score, _index, label] = fields.as_slice() else {
                return Err(Error::Decode(format!(
                    "Expected 3 fields in classification entry '{}'",
                    entry
                )));
            };

            let score: f32 = score
                .parse()
                .map_err(|_| Error::Decode(format!("Invalid score in classification entry '{}'", entry)))?;

            Ok(ClassificationOutput {
                category: label.to_string(),
                score,
            })
        })
        .collect()
}

/// Converts per-item corner-form boxes, dropping sentinel padding
pub fn decode_detection(boxes: &[Vec<[f32; 5]>], labels: &[Vec<String>]) -> Result<Vec<DetectionOutput>> {
    if boxes.len() != labels.len() {
        return Err(Error::Decode(format!(
            "{} box groups for {} label groups",
            boxes.len(),
            labels.len()
        )));
    }

    boxes
        .iter()
        .zip(labels)
        .map(|(item_boxes, item_labels)| {
            if item_boxes.len() != item_labels.len() {
                return Err(Error::Decode(format!(
                    "{} boxes for {} labels",
                    item_boxes.len(),
                    item_labels.len()
                )));
            }

            let contents = item_boxes
                .iter()
                .zip(item_labels)
                .filter(|(_, label)| label.as_str() != SENTINEL_LABEL)
                .map(|([x1, y1, x2, y2, score], label)| BoundingBoxPrediction {
                    category: label.clone(),
                    score: *score,
                    bounding_box: BoundingBox::from_corners(*x1, *y1, *x2, *y2),
                })
                .collect();

            Ok(DetectionOutput { contents })
        })
        .collect()
}
