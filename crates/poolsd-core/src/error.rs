//! Error types for poolsd
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for poolsd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for poolsd
#[derive(Error, Debug)]
pub enum Error {
    /// The API returned no pool for the requested identifiers
    #[error("Instance pool not found: {0}")]
    PoolNotFound(String),

    /// The API returned more than one pool for the requested identifiers
    #[error("More than one instance pool returned ({count}) for {pool_id}")]
    AmbiguousPool {
        /// Requested pool ID
        pool_id: String,
        /// Number of pools returned
        count: usize,
    },

    /// Discovery file output errors
    #[error("Discovery output error: {0}")]
    Output(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors (connection refused, timeouts, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
        /// Whether the provider considers the failure temporary (e.g. HTTP 5xx)
        transient: bool,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "pool not found" error
    pub fn pool_not_found(msg: impl Into<String>) -> Self {
        Self::PoolNotFound(msg.into())
    }

    /// Create an "ambiguous pool" error
    pub fn ambiguous_pool(pool_id: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousPool {
            pool_id: pool_id.into(),
            count,
        }
    }

    /// Create a discovery output error
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            transient: false,
        }
    }

    /// Create a provider-specific error that may succeed on a later attempt
    pub fn provider_transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            transient: true,
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether a later poll cycle could plausibly succeed without operator action
    ///
    /// Missing or ambiguous pools, bad credentials and local output failures
    /// are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited(_) => true,
            Error::Provider { transient, .. } => *transient,
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
