//! HTML fallback lookup against the JavaScript-free DuckDuckGo result page.
//!
//! Used when the structured API returns nothing. The page is scraped with
//! CSS selectors and result links are unwrapped through
//! [`crate::redirect::resolve_redirect`].

use crate::config::ProviderConfig;
use crate::error::SearchError;
use crate::http;
use crate::redirect::resolve_redirect;
use crate::types::{RawResult, ResultKind};
use scraper::{Html, Selector};

/// Query the HTML endpoint and scrape organic results.
///
/// # Errors
///
/// Returns [`SearchError::Http`] on request failure and
/// [`SearchError::Parse`] if the result selectors are invalid.
pub async fn lookup_html(
    query: &str,
    config: &ProviderConfig,
) -> Result<Vec<RawResult>, SearchError> {
    tracing::trace!(query, "HTML fallback lookup");

    let client = http::build_client(config)?;

    let response = client
        .post(&config.html_endpoint)
        .form(&[("q", query)])
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("HTML lookup request failed: {e}")))?
        .error_for_status()
        .map_err(|e| SearchError::Http(format!("HTML lookup HTTP error: {e}")))?;

    let html = response
        .text()
        .await
        .map_err(|e| SearchError::Http(format!("HTML response read failed: {e}")))?;

    tracing::trace!(bytes = html.len(), "HTML response received");

    parse_result_page(&html, config.max_results)
}

/// Parse a result page into raw results.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_result_page(
    html: &str,
    max_results: usize,
) -> Result<Vec<RawResult>, SearchError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(".result:not(.result--ad)")
        .map_err(|e| SearchError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".result__a")
        .map_err(|e| SearchError::Parse(format!("invalid title selector: {e:?}")))?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| SearchError::Parse(format!("invalid snippet selector: {e:?}")))?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let title_el = match element.select(&title_sel).next() {
            Some(el) => el,
            None => continue,
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let href = title_el.value().attr("href").unwrap_or("");
        let url = if href.is_empty() {
            String::new()
        } else {
            resolve_redirect(href)
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(RawResult {
            title,
            snippet,
            url,
            kind: ResultKind::SearchResult,
        });

        if results.len() >= max_results {
            break;
        }
    }

    tracing::debug!(count = results.len(), "HTML results parsed");
    Ok(results)
}
