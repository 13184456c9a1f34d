//! Configuration loading
//!
//! Sources are layered lowest to highest: built-in defaults, an optional
//! configuration file (format picked from its extension), then environment
//! variables such as `CFG_RUNTIME__URL`.

use std::path::{Path, PathBuf};

use config_rs::{Config, Environment, File};
use tracing::{debug, info};

use common::error::{Error, Result};

use crate::schema::AppConfig;
use crate::validation::ConfigValidator;

/// Default environment prefix
pub const ENV_PREFIX: &str = "CFG";

/// Loaded, validated configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Effective configuration
    config: AppConfig,

    /// File the configuration was read from, if any
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Loads configuration from an optional file and the `CFG_` environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Loads configuration using a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        ConfigValidator::validate(&config)?;

        debug!("Effective configuration: {:?}", config);

        Ok(Self {
            config,
            source: path.map(Path::to_path_buf),
        })
    }

    /// Wraps an already-built configuration after validating it
    pub fn from_config(config: AppConfig) -> Result<Self> {
        ConfigValidator::validate(&config)?;
        Ok(Self { config, source: None })
    }

    /// Returns the effective configuration
    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the file the configuration was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_file() {
        let manager = ConfigManager::load_with_prefix(None, "CFGTEST_DEFAULTS").unwrap();
        assert_eq!(manager.get(), &AppConfig::default());
        assert!(manager.source().is_none());
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "runtime:\n  url: http://triton:8000\n  infer_timeout_ms: 1500\nlogging:\n  format: json"
        )
        .unwrap();

        std::env::set_var("CFGTEST_LAYERED_RUNTIME__URL", "http://override:9000");
        let manager =
            ConfigManager::load_with_prefix(Some(file.path()), "CFGTEST_LAYERED").unwrap();
        std::env::remove_var("CFGTEST_LAYERED_RUNTIME__URL");

        let config = manager.get();
        assert_eq!(config.runtime.url, "http://override:9000");
        assert_eq!(config.runtime.infer_timeout_ms, 1500);
        assert_eq!(config.runtime.control_timeout_ms, 60_000);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logging:\n  format: xml").unwrap();

        let err = ConfigManager::load_with_prefix(Some(file.path()), "CFGTEST_INVALID").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
