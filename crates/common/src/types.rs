//! Prediction result types
//!
//! Typed outputs produced by the inference dispatcher after decoding raw
//! runtime tensors for a given task.

use serde::{Deserialize, Serialize};

/// One classification score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutput {
    /// Predicted label
    pub category: String,
    /// Confidence score
    pub score: f32,
}

/// Box in top-left + extent form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Converts a corner-form box `(x1, y1, x2, y2)`
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            left: x1,
            top: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }
}

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxPrediction {
    pub category: String,
    pub score: f32,
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
}

/// Detections for a single batch item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionOutput {
    pub contents: Vec<BoundingBoxPrediction>,
}

/// Task-typed result of a predict call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", content = "output", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionResult {
    /// Flat list of scores across the batch
    Classification(Vec<ClassificationOutput>),
    /// One entry per batch item
    Detection(Vec<DetectionOutput>),
    /// Post-processed runtime output returned unchanged
    Raw(serde_json::Value),
}
