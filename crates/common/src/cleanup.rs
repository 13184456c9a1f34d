//! Best-effort cleanup bookkeeping
//!
//! Deletes touch three stores, only one of which (the metadata store) is
//! authoritative. Failures in the other two are collected here instead of
//! being raised, so the type system keeps them apart from `Error`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Step of a delete that may fail without failing the delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStage {
    /// Unloading the ensemble artifact from the runtime
    Unload,
    /// Removing artifact files from the artifact store
    RemoveFiles,
    /// Looking up what needs cleaning
    Lookup,
}

impl CleanupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupStage::Unload => "unload",
            CleanupStage::RemoveFiles => "remove_files",
            CleanupStage::Lookup => "lookup",
        }
    }
}

impl fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single non-fatal failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    pub stage: CleanupStage,
    /// Artifact name or record the step was acting on
    pub target: String,
    pub message: String,
}

/// Aggregate of non-fatal failures from a best-effort cleanup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    failures: Vec<CleanupFailure>,
}

impl CleanupResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure
    pub fn record(&mut self, stage: CleanupStage, target: impl Into<String>, error: impl fmt::Display) {
        self.failures.push(CleanupFailure {
            stage,
            target: target.into(),
            message: error.to_string(),
        });
    }

    /// Records the error of a step, if any
    pub fn check<T, E: fmt::Display>(
        &mut self,
        stage: CleanupStage,
        target: &str,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(stage, target, e);
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    /// Emits one warning per failure
    pub fn log(&self, operation: &str) {
        for failure in &self.failures {
            warn!(
                operation,
                stage = %failure.stage,
                target = %failure.target,
                "Cleanup step failed: {}",
                failure.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_collects_errors() {
        let mut cleanup = CleanupResult::new();
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("engine offline".to_string());

        assert_eq!(cleanup.check(CleanupStage::Unload, "a", ok), Some(1));
        assert_eq!(cleanup.check(CleanupStage::Unload, "b", err), None);

        assert!(!cleanup.is_clean());
        assert_eq!(cleanup.failures().len(), 1);
        assert_eq!(cleanup.failures()[0].target, "b");
        assert_eq!(cleanup.failures()[0].message, "engine offline");
    }
}
