//! Error types for cnamesync
//!
//! This module defines all error types used throughout the workspace.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for cnamesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cnamesync
#[derive(Error, Debug)]
pub enum Error {
    /// A hostname did not resolve within the retry budget
    #[error("could not resolve {host} after {attempts} attempt(s): {last_error}")]
    Resolution {
        /// The host that was looked up
        host: String,
        /// Number of attempts made
        attempts: u32,
        /// The error reported by the last attempt
        last_error: String,
    },

    /// The top-level domain pattern did not match
    #[error("could not get top level domain of '{0}'")]
    Extraction(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// DNS provider errors
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The reconciliation pass exceeded its deadline
    #[error("reconciliation pass exceeded deadline of {0:?}")]
    Timeout(Duration),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a resolution error
    pub fn resolution(
        host: impl Into<String>,
        attempts: u32,
        last_error: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            host: host.into(),
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Create an extraction error for the given input
    pub fn extraction(input: impl Into<String>) -> Self {
        Self::Extraction(input.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Short stable identifier of the error kind, used in API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Resolution { .. } => "resolution",
            Error::Extraction(_) => "extraction",
            Error::Config(_) => "configuration",
            Error::Provider { .. } => "provider",
            Error::Timeout(_) => "timeout",
            Error::Http(_) => "http",
            Error::Json(_) => "json",
        }
    }
}
