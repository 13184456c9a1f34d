//! Configuration validation

use common::error::{Error, Result};

use crate::schema::AppConfig;

/// Rejects configurations the services cannot run with
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.runtime.url.trim().is_empty() {
            return Err(Error::Config("runtime.url must not be empty".to_string()));
        }

        if config.runtime.control_timeout_ms == 0 || config.runtime.infer_timeout_ms == 0 {
            return Err(Error::Config("runtime timeouts must be greater than zero".to_string()));
        }

        if config.identity.lookup_timeout_ms == 0 {
            return Err(Error::Config("identity.lookup_timeout_ms must be greater than zero".to_string()));
        }

        if config.database.url.trim().is_empty() {
            return Err(Error::Config("database.url must not be empty".to_string()));
        }

        match config.logging.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(Error::Config(format!(
                    "logging.format must be 'pretty' or 'json', got '{}'",
                    other
                )))
            }
        }

        Ok(())
    }
}
