//! Bootstrap error types

use thiserror::Error;

use crate::sinks::SinkError;

/// Errors that can occur while loading or applying a logging configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid PII mask `{pattern}`: {source}")]
    InvalidMask {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to create sink: {0}")]
    Sink(#[from] SinkError),

    #[error("No log directory configured and no platform data directory available")]
    NoLogDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
