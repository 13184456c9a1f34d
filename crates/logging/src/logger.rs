//! Tracing subscriber setup

use std::str::FromStr;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use common::error::{Error, Result};
use config::LoggingConfig;

/// Log file name prefix used by the rolling appender
const LOG_FILE_PREFIX: &str = "model-orchestrator.log";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(Error::Config(format!("Unknown log format: {}", s))),
        }
    }
}

/// Keeps the background log writer alive; drop it on shutdown to flush
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Builds the event filter; `RUST_LOG` wins over the configured level
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", level, e))),
    }
}

/// Installs the global subscriber
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let format: LogFormat = config.format.parse()?;
    let filter = build_filter(&config.level)?;

    let (writer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install log subscriber: {}", e)))?;

    info!(format = ?format, directory = ?config.directory, "Logging initialized");

    Ok(LogGuard { _file: guard })
}
