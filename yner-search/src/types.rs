//! Core types for lookup results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single raw result returned by a lookup strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResult {
    /// Title of the result. May be empty for definition entries.
    pub title: String,
    /// Text snippet summarising the result.
    pub snippet: String,
    /// Absolute URL of the result, or an empty string when unresolvable.
    pub url: String,
    /// Which lookup strategy produced this result.
    pub kind: ResultKind,
}

/// Provenance tag for a lookup result. Display-only; carries no behavioural
/// meaning anywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// Instant-answer abstract from the structured API.
    InstantAnswer,
    /// Dictionary definition from the structured API.
    Definition,
    /// Related topic from the structured API.
    RelatedTopic,
    /// Organic result scraped from the HTML fallback.
    SearchResult,
}

impl ResultKind {
    /// Returns the wire name of this kind, as serialized into envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstantAnswer => "instant_answer",
            Self::Definition => "definition",
            Self::RelatedTopic => "related_topic",
            Self::SearchResult => "search_result",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
