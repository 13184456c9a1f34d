//! Model and version registry for the model orchestrator
//!
//! This crate provides the relational source of truth for models, their
//! versions and the runtime artifacts each version deploys, with an
//! in-memory store for tests and single-shot use and a SQLite store for
//! persistent deployments.

pub mod memory;
pub mod registry;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod conformance;

// Re-export commonly used types
pub use memory::InMemoryStore;
pub use registry::ModelRegistry;
pub use sqlite::SqliteStore;
pub use store::{MetadataStore, VersionDeletion};
