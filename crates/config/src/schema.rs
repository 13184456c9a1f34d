//! Configuration schema
//!
//! Every section deserializes with defaults, so an empty file (or no file at
//! all) yields a usable single-node setup.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub runtime: RuntimeConfig,
    pub artifact_store: ArtifactStoreConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

/// Per-user data directory shared by the metadata and artifact stores
fn data_home() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("model-orchestrator")
}

/// Metadata store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `memory` or the path of a SQLite database file
    pub url: String,
}

impl DatabaseConfig {
    /// Process-local store; metadata is lost on exit
    pub fn in_memory() -> Self {
        Self {
            url: "memory".to_string(),
        }
    }

    /// Returns the SQLite path, or `None` for the in-memory store
    pub fn sqlite_path(&self) -> Option<PathBuf> {
        match self.url.as_str() {
            "memory" | ":memory:" => None,
            url => Some(PathBuf::from(url.strip_prefix("sqlite://").unwrap_or(url))),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: data_home().join("models.sqlite").display().to_string(),
        }
    }
}

/// Inference runtime endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Base URL of the runtime's HTTP endpoint
    pub url: String,
    /// Bound for readiness, load, unload, metadata and config calls
    pub control_timeout_ms: u64,
    /// Bound for inference calls
    pub infer_timeout_ms: u64,
}

impl RuntimeConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn infer_timeout(&self) -> Duration {
        Duration::from_millis(self.infer_timeout_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            control_timeout_ms: 60_000,
            infer_timeout_ms: 30_000,
        }
    }
}

/// Artifact store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactStoreConfig {
    /// Root directory; one sub-directory per artifact
    pub root: PathBuf,
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            root: data_home().join("model-store"),
        }
    }
}

/// Owner resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Bound for token-cache and membership lookups
    pub lookup_timeout_ms: u64,
    /// Owner used when the CLI is run without explicit credentials
    pub default_owner: String,
}

impl IdentityConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 5_000,
            default_owner: "local-user".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Optional directory for a daily rolling log file
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}
