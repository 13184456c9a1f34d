//! Command-line interface for the model orchestrator
//!
//! Parses the model lifecycle subcommands and runs them against a
//! [`orchestrator_core::ModelService`], printing JSON results.

pub mod cli;
pub mod commands;
pub mod formatters;

// Re-export commonly used types
pub use cli::{Cli, Command};
pub use commands::execute;
pub use formatters::{print_output, render};
