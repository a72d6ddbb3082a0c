//! Error types for the voltrace renderer

use thiserror::Error;

/// Main error type for the renderer core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction-time configuration: unknown variant, mismatched
    /// attachment sizes, missing shader program or uniform, bad property.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// GPU resource allocation failed. Never retried.
    #[error("Resource error: {0}")]
    Resource(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::Configuration`]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for [`Error::Resource`]
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// True for errors raised while validating configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
