//! Search orchestration: query cleaning, provider invocation, envelope
//! construction, and prompt augmentation.
//!
//! Search is best-effort by policy. The orchestrator never raises: provider
//! failures degrade to the explicit "no results" rendering so the generation
//! request is never blocked by a lookup problem, and downstream consumers can
//! always tell an empty search from a search that never happened.

use crate::config::SearchSettings;
use crate::envelope::SearchEnvelope;
use yner_search::ProviderConfig;

/// Maximum length, in characters, of the query issued to the provider.
const MAX_QUERY_CHARS: usize = 100;

/// Maximum length of the cosmetic query shown in logs and progress output.
/// Intentionally shorter than [`MAX_QUERY_CHARS`]; the two limits serve
/// different consumers and must not be conflated.
const MAX_DISPLAY_CHARS: usize = 50;

/// Output of one augmentation pass.
#[derive(Debug, Clone)]
pub struct Augmented {
    /// The envelope to multiplex into the response.
    pub envelope: SearchEnvelope,
    /// Original prompt plus the rendered search block.
    pub augmented_prompt: String,
}

/// Runs a web search for every prompt and folds the results into it.
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    provider: ProviderConfig,
}

impl SearchOrchestrator {
    /// Build an orchestrator from relay settings.
    pub fn new(settings: &SearchSettings) -> Self {
        let mut provider = ProviderConfig {
            max_results: settings.max_results,
            timeout_seconds: settings.timeout_secs,
            ..Default::default()
        };
        if let Some(ref endpoint) = settings.api_endpoint {
            provider.api_endpoint = endpoint.clone();
        }
        if let Some(ref endpoint) = settings.html_endpoint {
            provider.html_endpoint = endpoint.clone();
        }
        Self { provider }
    }

    /// Clean the prompt into a query, search, and append the rendered block.
    pub async fn augment(&self, prompt: &str) -> Augmented {
        let query = clean_query(prompt);
        tracing::debug!(query = %display_query(prompt), "issuing web search");

        let results = match yner_search::lookup(&query, &self.provider).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(error = %err, "search provider failed; continuing without results");
                Vec::new()
            }
        };

        let envelope = SearchEnvelope::from_results(&query, results);
        let block = if envelope.total_results > 0 {
            render_results_block(&envelope)
        } else {
            render_no_results_block(&envelope)
        };

        Augmented {
            envelope,
            augmented_prompt: format!("{prompt}{block}"),
        }
    }
}

/// Derive the search query from a raw prompt: strip `?`, `!` and `.`, trim,
/// truncate to at most [`MAX_QUERY_CHARS`] characters.
pub fn clean_query(prompt: &str) -> String {
    let cleaned: String = prompt
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | '.'))
        .collect();
    cleaned.trim().chars().take(MAX_QUERY_CHARS).collect()
}

/// Cosmetic variant of [`clean_query`] for logs and progress display:
/// truncated to [`MAX_DISPLAY_CHARS`] characters with a `...` suffix.
pub fn display_query(prompt: &str) -> String {
    let cleaned: String = prompt
        .chars()
        .filter(|c| !matches!(c, '?' | '!' | '.'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().count() > MAX_DISPLAY_CHARS {
        let head: String = cleaned.chars().take(MAX_DISPLAY_CHARS).collect();
        format!("{head}...")
    } else {
        cleaned.to_owned()
    }
}

/// Render the search block appended to the prompt when sources were found.
///
/// The block is opaque text for the model's consumption; nothing downstream
/// parses it again.
fn render_results_block(envelope: &SearchEnvelope) -> String {
    let mut block = String::new();
    block.push_str("\n\n=== STRUCTURED WEB SEARCH DATA ===\n");
    block.push_str(&format!("Query: \"{}\"\n", envelope.query));
    block.push_str(&format!("Date: {}\n", envelope.search_date));
    block.push_str(&format!("Available sources: {}\n\n", envelope.total_results));

    block.push_str("FORMATTING INSTRUCTIONS:\n");
    block.push_str("- Use bullet points (\u{2022}) for lists\n");
    block.push_str("- Use dashes (-) for sub-points\n");
    block.push_str("- Leave a blank line between sections\n");
    block.push_str("- Cite sources as [Source X: site-name]\n");
    block.push_str("- Organise the answer into clear sections\n\n");

    for source in &envelope.sources {
        block.push_str(&format!("Source {}: {}\n", source.id, source.title));
        block.push_str(&format!("  Content: {}\n", source.snippet));
        block.push_str(&format!("  URL: {}\n", source.url));
        block.push_str(&format!("  Domain: {}\n", source.domain));
        block.push_str(&format!("  Type: {}\n\n", source.kind));
    }

    block.push_str("=== END OF SEARCH DATA ===\n\n");
    block
}

/// Render the block for a search that ran but found nothing. Explicitly
/// distinguishable from a search that was never attempted.
fn render_no_results_block(envelope: &SearchEnvelope) -> String {
    let mut block = String::new();
    block.push_str("\n\n=== WEB SEARCH PERFORMED ===\n");
    block.push_str(&format!("Query: \"{}\"\n", envelope.query));
    block.push_str(&format!("Date: {}\n", envelope.search_date));
    block.push_str("Result: no results were found on the web for this query.\n");
    block.push_str("=== END OF SEARCH ===\n\n");
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use yner_search::{RawResult, ResultKind};

    #[test]
    fn clean_query_strips_punctuation() {
        assert_eq!(
            clean_query("What is the capital of France?"),
            "What is the capital of France"
        );
        assert_eq!(clean_query("Hello! World. Really?!"), "Hello World Really");
    }

    #[test]
    fn clean_query_trims_whitespace() {
        assert_eq!(clean_query("  spaced out  "), "spaced out");
        // Trailing punctuation leaves whitespace behind, which is then trimmed.
        assert_eq!(clean_query("question ?"), "question");
    }

    #[test]
    fn clean_query_caps_at_one_hundred_chars() {
        let long = "a".repeat(250);
        assert_eq!(clean_query(&long).chars().count(), 100);
    }

    #[test]
    fn clean_query_cap_is_char_boundary_safe() {
        let long = "é".repeat(150);
        let query = clean_query(&long);
        assert_eq!(query.chars().count(), 100);
    }

    #[test]
    fn display_query_uses_the_shorter_cap() {
        let long = "b".repeat(80);
        let display = display_query(&long);
        assert_eq!(display.chars().count(), 53);
        assert!(display.ends_with("..."));
        // The search query keeps the full 80 characters.
        assert_eq!(clean_query(&long).chars().count(), 80);
    }

    #[test]
    fn display_query_short_prompts_untouched() {
        assert_eq!(display_query("short prompt"), "short prompt");
    }

    fn envelope_with(results: Vec<RawResult>) -> SearchEnvelope {
        SearchEnvelope::from_results("test query", results)
    }

    fn sample_result() -> RawResult {
        RawResult {
            title: "France".into(),
            snippet: "A country in Europe.".into(),
            url: "https://en.wikipedia.org/wiki/France".into(),
            kind: ResultKind::InstantAnswer,
        }
    }

    #[test]
    fn results_block_lists_every_source_field() {
        let block = render_results_block(&envelope_with(vec![sample_result()]));
        assert!(block.contains("Source 1: France"));
        assert!(block.contains("Content: A country in Europe."));
        assert!(block.contains("URL: https://en.wikipedia.org/wiki/France"));
        assert!(block.contains("Domain: en.wikipedia.org"));
        assert!(block.contains("Type: instant_answer"));
        assert!(block.contains("Available sources: 1"));
    }

    #[test]
    fn results_block_contains_formatting_instructions() {
        let block = render_results_block(&envelope_with(vec![sample_result()]));
        assert!(block.contains("FORMATTING INSTRUCTIONS"));
        assert!(block.contains("[Source X: site-name]"));
    }

    #[test]
    fn no_results_block_is_explicit_about_absence() {
        let block = render_no_results_block(&envelope_with(Vec::new()));
        assert!(block.contains("no results were found"));
        assert!(block.contains("test query"));
        assert!(!block.contains("FORMATTING INSTRUCTIONS"));
    }

    #[tokio::test]
    async fn augment_degrades_to_no_results_on_provider_failure() {
        // Point both endpoints at a closed local port; lookups fail fast.
        let orchestrator = SearchOrchestrator::new(&SearchSettings {
            timeout_secs: 1,
            api_endpoint: Some("http://127.0.0.1:9".into()),
            html_endpoint: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        });
        let augmented = orchestrator.augment("Does this still work?").await;
        assert_eq!(augmented.envelope.total_results, 0);
        assert_eq!(augmented.envelope.query, "Does this still work");
        assert!(augmented.augmented_prompt.starts_with("Does this still work?"));
        assert!(augmented.augmented_prompt.contains("no results were found"));
    }
}
