//! Control-plane metrics
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! these are no-ops.

use metrics::{counter, increment_counter};

use common::cleanup::CleanupResult;

use crate::state::TargetStatus;

/// Counts a finished status transition
pub fn record_transition(target: TargetStatus, succeeded: bool) {
    let outcome = if succeeded { "success" } else { "failure" };
    increment_counter!(
        "model_version_transitions_total",
        "target" => target.as_str(),
        "outcome" => outcome
    );
}

/// Counts the failures of a best-effort cleanup by stage
pub fn record_cleanup(result: &CleanupResult) {
    for failure in result.failures() {
        counter!("model_cleanup_failures_total", 1, "stage" => failure.stage.as_str());
    }
}
