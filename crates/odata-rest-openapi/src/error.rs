//! Typed error enum for the `odata-rest-openapi` library API.
//!
//! The server binary converts these to `anyhow::Error` at its boundary for
//! richer context messages.

/// Errors produced by `odata-rest-openapi` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading a config file).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// No routes were synthesized for the requested service.
    #[error("service '{service}' has no synthesized routes")]
    UnknownService {
        /// The requested service name.
        service: String,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;
