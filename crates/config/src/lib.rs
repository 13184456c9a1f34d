//! Configuration management for the model orchestrator
//!
//! This crate loads layered configuration (defaults, file, environment)
//! into a typed [`AppConfig`] and validates it before any service starts.

pub mod manager;
pub mod schema;
pub mod validation;

// Re-export commonly used types
pub use manager::ConfigManager;
pub use schema::{
    AppConfig, ArtifactStoreConfig, DatabaseConfig, IdentityConfig, LoggingConfig, RuntimeConfig,
};
pub use validation::ConfigValidator;
