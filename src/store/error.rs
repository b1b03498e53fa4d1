//! Error types for configuration storage.

use thiserror::Error;

/// Why a submitted payload was refused.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("payload is not a valid proxy configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("domainNames must contain at least one entry")]
    MissingDomainNames,

    #[error("proxyTo must be a non-empty address")]
    MissingProxyTo,
}

/// Error type for [`ConfigStore`](super::ConfigStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The name cannot be mapped to a file inside the store directory.
    #[error("invalid configuration name {0:?}")]
    InvalidName(String),

    #[error("proxy configuration {0:?} not found")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }
}
