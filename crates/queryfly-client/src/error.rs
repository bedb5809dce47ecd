//! Error types for the client crate.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file extension is not one of `yaml`, `yml`, `json`.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Neither a DSN nor any host is configured.
    #[error("no dsn or host configured")]
    NoHost,
}

/// Errors from running a query.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The builder could not be compiled.
    #[error(transparent)]
    Query(#[from] queryfly::QueryError),

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body is not valid JSON.
    #[error("url[{url}] error[response is not valid JSON: {source}]")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The service answered with a failure status.
    #[error("url[{url}] error[status {status}: {message}]")]
    Service {
        url: String,
        status: i64,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
