//! Utility functions for the model orchestrator
//!
//! Timeouts, request limits and name validation shared across crates.

use std::future::Future;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::timeout;

use crate::error::{Error, Result};

/// Maximum number of inputs accepted by one predict call
pub const MAX_BATCH_SIZE: usize = 32;

/// Maximum size of a single raw input
pub const MAX_INPUT_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Pattern every model name must match
pub const MODEL_NAME_PATTERN: &str = "^[A-Za-z0-9][a-zA-Z0-9_.-]*$";

static MODEL_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(MODEL_NAME_PATTERN).expect("model name pattern is valid"));

/// Checks a model name against [`MODEL_NAME_PATTERN`]
///
/// # Examples
///
/// ```
/// use common::utils::validate_model_name;
///
/// assert!(validate_model_name("resnet-50.v2").is_ok());
/// assert!(validate_model_name("_hidden").is_err());
/// ```
pub fn validate_model_name(name: &str) -> Result<()> {
    if MODEL_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "The name of model is invalid: '{}' must match {}",
            name, MODEL_NAME_PATTERN
        )))
    }
}

/// Checks batch size and per-input size limits
pub fn validate_batch<T: AsRef<[u8]>>(inputs: &[T]) -> Result<()> {
    if inputs.is_empty() {
        return Err(Error::Validation("At least one input is required".to_string()));
    }

    if inputs.len() > MAX_BATCH_SIZE {
        return Err(Error::Validation(format!(
            "Batch size {} exceeds the maximum of {}",
            inputs.len(),
            MAX_BATCH_SIZE
        )));
    }

    for (i, input) in inputs.iter().enumerate() {
        let len = input.as_ref().len();
        if len > MAX_INPUT_SIZE_BYTES {
            return Err(Error::Validation(format!(
                "Input {} is {} bytes, the maximum is {} bytes",
                i, len, MAX_INPUT_SIZE_BYTES
            )));
        }
    }

    Ok(())
}

/// Formats a duration into a human-readable string
///
/// # Examples
///
/// ```
/// use common::utils::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs == 0 {
        let millis = duration.subsec_millis();
        if millis == 0 {
            return format!("{}µs", duration.subsec_micros());
        }
        return format!("{}ms", millis);
    }

    let hours = total_secs / (60 * 60);
    let minutes = (total_secs % (60 * 60)) / 60;
    let seconds = total_secs % 60;

    let mut result = String::new();

    if hours > 0 {
        result.push_str(&format!("{}h ", hours));
    }

    if minutes > 0 || !result.is_empty() {
        result.push_str(&format!("{}m ", minutes));
    }

    result.push_str(&format!("{}s", seconds));

    result
}

/// Executes a future with a timeout
///
/// Dropping the returned future cancels the inner one, so a caller's own
/// deadline propagates through.
pub async fn execute_with_timeout<T, F>(
    future: F,
    duration: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "Operation '{}' timed out after {}",
            operation_name,
            format_duration(duration)
        ))),
    }
}
