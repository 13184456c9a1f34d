//! Common data models for the model orchestrator
//!
//! This module defines the metadata records shared by the registry, the
//! lifecycle state machine and the inference dispatcher.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Internal numeric model identifier
pub type ModelId = i64;

/// Task a model was trained for; drives output decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Task {
    /// No dedicated decoder; runtime output is passed through
    Unspecified,
    /// Image classification
    Classification,
    /// Object detection
    Detection,
}

impl Task {
    /// Numeric code used in persisted rows
    pub fn code(&self) -> i32 {
        match self {
            Task::Unspecified => 0,
            Task::Classification => 1,
            Task::Detection => 2,
        }
    }

    /// Maps a persisted code back to a task
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Task::Unspecified),
            1 => Some(Task::Classification),
            2 => Some(Task::Detection),
            _ => None,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Unspecified => write!(f, "UNSPECIFIED"),
            Task::Classification => write!(f, "CLASSIFICATION"),
            Task::Detection => write!(f, "DETECTION"),
        }
    }
}

impl FromStr for Task {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.strip_prefix("TASK_").unwrap_or(&upper) {
            "UNSPECIFIED" => Ok(Task::Unspecified),
            "CLASSIFICATION" => Ok(Task::Classification),
            "DETECTION" => Ok(Task::Detection),
            _ => Err(Error::Validation(format!("Unknown task: {}", s))),
        }
    }
}

/// Deployment status of a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    /// Not loaded in the runtime
    Offline,
    /// Ensemble artifact loaded in the runtime
    Online,
    /// Last transition failed; needs an explicit re-attempt
    Error,
}

impl VersionStatus {
    /// Returns the canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Offline => "OFFLINE",
            VersionStatus::Online => "ONLINE",
            VersionStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFLINE" => Ok(VersionStatus::Offline),
            "ONLINE" => Ok(VersionStatus::Online),
            "ERROR" => Ok(VersionStatus::Error),
            _ => Err(Error::Validation(format!("Unknown version status: {}", s))),
        }
    }
}

/// Model record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Internal identifier
    pub id: ModelId,
    /// Owning namespace, e.g. `users/local-user`
    pub namespace: String,
    /// Name, unique within the namespace
    pub name: String,
    /// Task type
    pub task: Task,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewModel {
    pub namespace: String,
    pub name: String,
    pub task: Task,
}

/// Version record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Owning model
    pub model_id: ModelId,
    /// Version number, starting at 1 and never reused
    pub number: u32,
    /// Deployment status
    pub status: VersionStatus,
    /// Free-form description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a version; the number is allocated by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVersion {
    pub description: String,
    pub status: VersionStatus,
}

impl Default for NewVersion {
    fn default() -> Self {
        Self {
            description: String::new(),
            status: VersionStatus::Offline,
        }
    }
}

/// Partial update of a version record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionPatch {
    pub status: Option<VersionStatus>,
    pub description: Option<String>,
}

impl VersionPatch {
    /// Patch that only changes the status
    pub fn status(status: VersionStatus) -> Self {
        Self {
            status: Some(status),
            description: None,
        }
    }

    /// Patch that only changes the description
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            status: None,
            description: Some(description.into()),
        }
    }
}

/// Deployable unit produced from a version and addressed by name in the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeArtifact {
    /// Runtime key and artifact-store directory name
    pub name: String,
    /// Owning model
    pub model_id: ModelId,
    /// Owning version number
    pub version: u32,
    /// Version string the runtime serves this artifact under
    pub runtime_version: u32,
    /// Whether this artifact is the version's inference entry point
    pub ensemble: bool,
}

impl RuntimeArtifact {
    /// Runtime version rendered the way the runtime addresses it
    pub fn runtime_version_str(&self) -> String {
        self.runtime_version.to_string()
    }
}

/// Model together with its versions and artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: Model,
    pub versions: Vec<Version>,
    pub artifacts: Vec<RuntimeArtifact>,
}

impl ModelInfo {
    /// Returns the version with the given number
    pub fn version(&self, number: u32) -> Option<&Version> {
        self.versions.iter().find(|v| v.number == number)
    }

    /// Returns the highest-numbered version
    pub fn latest_version(&self) -> Option<&Version> {
        self.versions.iter().max_by_key(|v| v.number)
    }
}
