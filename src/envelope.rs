//! The structured result envelope sent once per generation request.
//!
//! Field names follow the wire format consumed by existing clients:
//! `searchDate`, `totalResults`, and per-source `type` tags.

use chrono::Local;
use serde::{Deserialize, Serialize};
use yner_search::{RawResult, ResultKind};

/// Sentinel domain used when a source URL is absent or unusable.
pub const UNKNOWN_DOMAIN: &str = "unknown source";

/// One retrieved source within an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSource {
    /// 1-based position among the de-duplicated results for this query.
    pub id: u32,
    /// Title of the source. May be empty.
    pub title: String,
    /// Text snippet. May be empty.
    pub snippet: String,
    /// Absolute URL, or an empty string when unresolvable.
    pub url: String,
    /// Provenance tag only; no behavioural effect.
    #[serde(rename = "type")]
    pub kind: ResultKind,
    /// Host of `url` with a leading `www.` stripped, best-effort raw string
    /// when `url` is not an absolute URL, or [`UNKNOWN_DOMAIN`].
    pub domain: String,
}

impl SearchSource {
    fn from_raw(id: u32, raw: RawResult) -> Self {
        let domain = domain_for(&raw.url);
        Self {
            id,
            title: raw.title,
            snippet: raw.snippet,
            url: raw.url,
            kind: raw.kind,
            domain,
        }
    }
}

/// The once-per-request search summary.
///
/// Constructed by the orchestrator, immutable afterwards, serialized exactly
/// once into the response stream (and mirrored in the `X-Search-Metadata`
/// header). Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEnvelope {
    /// The cleaned query actually issued to the provider.
    pub query: String,
    /// Capture-time timestamp, formatted for human display only. No parsing
    /// contract exists for this field.
    pub search_date: String,
    /// Ordered sources, provider return order, capped at the result limit.
    pub sources: Vec<SearchSource>,
    /// Always equal to `sources.len()`.
    pub total_results: usize,
}

impl SearchEnvelope {
    /// Build an envelope from provider results, assigning 1-based ids and
    /// stamping the capture time.
    pub fn from_results(query: &str, results: Vec<RawResult>) -> Self {
        let sources: Vec<SearchSource> = results
            .into_iter()
            .enumerate()
            .map(|(index, raw)| SearchSource::from_raw(index as u32 + 1, raw))
            .collect();
        let total_results = sources.len();
        Self {
            query: query.to_owned(),
            search_date: Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
            sources,
            total_results,
        }
    }
}

/// Derive a display domain from a source URL.
///
/// Absolute URLs yield their host minus a leading `www.`. Anything else
/// degrades to a raw best-effort extraction (strip scheme, strip `www.`,
/// take up to the first slash) rather than failing the envelope; an empty
/// outcome yields [`UNKNOWN_DOMAIN`].
pub fn domain_for(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return UNKNOWN_DOMAIN.to_owned();
    }

    if let Ok(parsed) = url::Url::parse(trimmed) {
        if let Some(host) = parsed.host_str() {
            return host.strip_prefix("www.").unwrap_or(host).to_owned();
        }
    }

    let raw = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let raw = raw.strip_prefix("www.").unwrap_or(raw);
    let raw = raw.split('/').next().unwrap_or("");
    if raw.is_empty() {
        UNKNOWN_DOMAIN.to_owned()
    } else {
        raw.to_owned()
    }
}
