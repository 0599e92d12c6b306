//! # yner-search
//!
//! Best-effort embedded web lookup for yner.
//!
//! This crate answers one question, "what does the web say about this
//! query?", with no API keys, no external services, and no user setup. It
//! compiles into the relay binary as a library dependency.
//!
//! ## Design
//!
//! - Primary: the DuckDuckGo Instant Answer API (structured JSON)
//! - Fallback: the JavaScript-free HTML result page, scraped with CSS selectors
//! - Redirect-wrapped result links are resolved to their real destination
//! - Output is de-duplicated by URL and capped at a configured maximum
//! - Graceful degradation: engine failures produce an empty result list,
//!   never an error at the public entry point
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - No network listeners — this is a library, not a server
//! - Queries are logged at debug/trace level only

pub mod config;
pub mod error;
pub mod html;
pub mod http;
pub mod instant;
pub mod redirect;
pub mod types;

pub use config::ProviderConfig;
pub use error::{Result, SearchError};
pub use types::{RawResult, ResultKind};

use std::collections::HashSet;

/// Look up a query, trying the structured API first and falling back to the
/// HTML result page when it yields nothing.
///
/// Results are de-duplicated by non-empty URL (first occurrence wins) and
/// capped at `config.max_results`. Engine failures are logged and degrade to
/// an empty list; only an invalid `config` produces an error.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` fails validation.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> yner_search::Result<()> {
/// let config = yner_search::ProviderConfig::default();
/// let results = yner_search::lookup("rust programming", &config).await?;
/// for result in &results {
///     println!("{}: {}", result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn lookup(query: &str, config: &ProviderConfig) -> Result<Vec<RawResult>> {
    config.validate()?;

    let mut results = match instant::lookup_instant(query, config).await {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!(error = %err, "instant answer lookup failed");
            Vec::new()
        }
    };

    if results.is_empty() {
        match html::lookup_html(query, config).await {
            Ok(fallback) => results = fallback,
            Err(err) => tracing::warn!(error = %err, "HTML fallback lookup failed"),
        }
    }

    dedup_by_url(&mut results);
    results.truncate(config.max_results);
    Ok(results)
}

/// Drop results whose non-empty URL was already seen. Results with an empty
/// URL are all kept; there is nothing to compare them by.
fn dedup_by_url(results: &mut Vec<RawResult>) {
    let mut seen = HashSet::new();
    results.retain(|r| r.url.is_empty() || seen.insert(r.url.clone()));
}
