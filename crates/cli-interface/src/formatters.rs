//! Output rendering

use serde_json::Value;

/// Pretty-printed JSON
pub fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn print_output(value: &Value) {
    println!("{}", render(value));
}
