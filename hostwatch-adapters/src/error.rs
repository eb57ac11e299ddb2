//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to an external system.
///
/// Every variant is recoverable: callers log it and carry on with the
/// rest of the cycle.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The sampling command failed entirely (spawn error, non-zero exit,
    /// unusable output).
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single record or reply could not be parsed.
    #[error("Failed to parse: {0}")]
    Parse(String),

    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for an HTTP response.
    #[error("Request timed out")]
    Timeout,

    /// The adapter was asked for something it cannot provide.
    #[error("Not supported: {0}")]
    Unsupported(String),
}

impl AdapterError {
    /// Whether this error came from delivering a notification rather than
    /// from sampling.
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            AdapterError::Http(_) | AdapterError::Connection(_) | AdapterError::Timeout
        )
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
