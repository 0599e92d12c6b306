//! Error types for the yner-search crate.
//!
//! All errors carry stable string messages suitable for display. No query
//! text or sensitive data appears in error messages.

/// Errors that can occur during a lookup.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An HTTP request to a lookup endpoint failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse an endpoint response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid provider configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for yner-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
