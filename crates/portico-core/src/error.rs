//! Error types for Portico.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Cache errors
    #[error("Cache partition unavailable: {name}: {reason}")]
    CacheOpen { name: String, reason: String },

    #[error("Cache write failed for {key}: {reason}")]
    CacheWrite { key: String, reason: String },

    #[error("Cache read failed: {0}")]
    CacheRead(String),

    #[error("Cache partition not found: {0}")]
    PartitionNotFound(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
