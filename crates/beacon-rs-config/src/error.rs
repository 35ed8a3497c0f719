//! Config error type.

use thiserror::Error;

/// Failure while reading, parsing or checking a Beacon config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON5.
    #[error("config is not valid json5: {0}")]
    Syntax(#[from] json5::Error),
    /// The merged document does not fit the config model.
    #[error("config does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
    /// A value is out of range or of the wrong type; `path` is `layer:a.b.c`.
    #[error("{path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("server url '{url}' is not usable: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// A `--config` path that does not exist.
    #[error("config file {0} does not exist")]
    MissingFile(String),
}
