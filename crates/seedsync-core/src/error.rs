//! Error types for the seedsync system
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for seedsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the seedsync system
#[derive(Error, Debug)]
pub enum Error {
    /// Live-node discovery errors
    #[error("RPC discovery error: {0}")]
    Rpc(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No zone visible to the credentials matches the configured domain
    #[error("Zone not found: no zone named '{domain}' is visible to these credentials")]
    ZoneNotFound {
        /// The domain that was looked up
        domain: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The backend answered, but the payload does not confirm success
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an RPC discovery error
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "zone not found" error for `domain`
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            domain: domain.into(),
        }
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

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the process cannot proceed
    ///
    /// Configuration mistakes (bad settings, unknown zone, rejected
    /// credentials) are not fixed by retrying and must be surfaced to the
    /// entry point.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ZoneNotFound { .. } | Self::Authentication(_)
        )
    }
}
