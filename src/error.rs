// Error taxonomy shared by the stores, the registry and configuration

use crate::validation::{describe, ValidationError};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Rejected before any store call was made.
    #[error("validation failed: {}", describe(.0))]
    Validation(Vec<ValidationError>),

    /// The hosted backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Insert succeeded but no row came back.
    #[error("backend returned no row for insert into '{0}'")]
    EmptyInsert(&'static str),

    /// Key or token from local configuration cannot be sent as a header.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A persisted collection could not be parsed.
    #[error("corrupt collection '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("{0} is required for the selected backend")]
    Missing(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
