//! Structured lookup via the DuckDuckGo Instant Answer API.
//!
//! This is the primary strategy: a keyless JSON endpoint that returns an
//! abstract, an optional dictionary definition, and related topics. Many
//! queries yield nothing here, in which case the caller falls back to the
//! HTML endpoint.

use crate::config::ProviderConfig;
use crate::error::SearchError;
use crate::http;
use crate::types::{RawResult, ResultKind};
use serde::Deserialize;

/// How many related topics to keep from the API response.
const MAX_RELATED_TOPICS: usize = 3;

#[derive(Debug, Deserialize)]
struct InstantAnswerResponse {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "Definition", default)]
    definition: String,
    #[serde(rename = "DefinitionURL", default)]
    definition_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

/// Related-topic entries; category groupings come back without `Text` and
/// deserialize to empty strings, which the mapping below skips.
#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
}

/// Query the Instant Answer API.
///
/// # Errors
///
/// Returns [`SearchError::Http`] on request failure and
/// [`SearchError::Parse`] when the response body is not the expected JSON.
pub async fn lookup_instant(
    query: &str,
    config: &ProviderConfig,
) -> Result<Vec<RawResult>, SearchError> {
    tracing::trace!(query, "instant answer lookup");

    let client = http::build_client(config)?;

    let response = client
        .get(&config.api_endpoint)
        .query(&[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ])
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("instant answer request failed: {e}")))?
        .error_for_status()
        .map_err(|e| SearchError::Http(format!("instant answer HTTP error: {e}")))?;

    let parsed: InstantAnswerResponse = response
        .json()
        .await
        .map_err(|e| SearchError::Parse(format!("instant answer response: {e}")))?;

    let results = collect_results(parsed, config.max_results);
    tracing::debug!(count = results.len(), "instant answer results");
    Ok(results)
}

/// Map an API response into raw results, preserving the abstract →
/// definition → related-topics order.
fn collect_results(data: InstantAnswerResponse, max_results: usize) -> Vec<RawResult> {
    let mut results = Vec::new();

    if !data.abstract_text.is_empty() {
        let title = if data.heading.is_empty() {
            "Information".to_owned()
        } else {
            data.heading
        };
        results.push(RawResult {
            title,
            snippet: data.abstract_text,
            url: data.abstract_url,
            kind: ResultKind::InstantAnswer,
        });
    }

    if !data.definition.is_empty() {
        results.push(RawResult {
            title: "Definition".to_owned(),
            snippet: data.definition,
            url: data.definition_url,
            kind: ResultKind::Definition,
        });
    }

    for topic in data.related_topics.into_iter().take(MAX_RELATED_TOPICS) {
        if topic.text.is_empty() {
            continue;
        }
        let title = topic
            .text
            .split(" - ")
            .next()
            .filter(|head| !head.is_empty())
            .unwrap_or("Information")
            .to_owned();
        results.push(RawResult {
            title,
            snippet: topic.text,
            url: topic.first_url,
            kind: ResultKind::RelatedTopic,
        });
    }

    results.truncate(max_results);
    results
}
