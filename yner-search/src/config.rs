//! Lookup configuration with sensible defaults.
//!
//! [`ProviderConfig`] controls result caps, timeouts, and which endpoints are
//! queried. The endpoint fields exist so tests can point the provider at a
//! local mock server instead of the public endpoints.

use crate::error::SearchError;

/// Default structured-lookup endpoint (DuckDuckGo Instant Answer API).
pub const DEFAULT_API_ENDPOINT: &str = "https://api.duckduckgo.com/";

/// Default HTML fallback endpoint (JavaScript-free result page).
pub const DEFAULT_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Configuration for a lookup operation.
///
/// Use [`Default::default()`] for sensible defaults, or construct with field
/// overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Maximum number of results to return after deduplication.
    pub max_results: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Structured-lookup endpoint.
    pub api_endpoint: String,
    /// HTML fallback endpoint.
    pub html_endpoint: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_seconds: 8,
            user_agent: None,
            api_endpoint: DEFAULT_API_ENDPOINT.to_owned(),
            html_endpoint: DEFAULT_HTML_ENDPOINT.to_owned(),
        }
    }
}

impl ProviderConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(SearchError::Config("api_endpoint must not be empty".into()));
        }
        if self.html_endpoint.trim().is_empty() {
            return Err(SearchError::Config(
                "html_endpoint must not be empty".into(),
            ));
        }
        Ok(())
    }
}
