//! Redirect resolution for wrapped result URLs.
//!
//! DuckDuckGo wraps organic result links in a redirector of the form
//! `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`. The real
//! destination lives URL-encoded in the `uddg` query parameter.

use url::Url;

/// Resolve a possibly-wrapped result URL to its real destination.
///
/// Protocol-relative inputs (`//host/...`) are given an `https:` scheme.
/// Inputs that are not redirector URLs are returned as-is (after the scheme
/// fix-up); inputs that cannot be parsed at all are passed through unchanged
/// rather than raising.
pub fn resolve_redirect(href: &str) -> String {
    let full = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_owned()
    };

    let Ok(parsed) = Url::parse(&full) else {
        return href.to_owned();
    };

    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == "uddg") {
            return value.into_owned();
        }
    }

    full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_redirect_url() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc";
        assert_eq!(resolve_redirect(href), "https://example.com/page");
    }

    #[test]
    fn unwraps_absolute_redirect_url() {
        let href = "https://duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FFrance";
        assert_eq!(resolve_redirect(href), "https://en.wikipedia.org/wiki/France");
    }

    #[test]
    fn direct_link_passes_through() {
        let href = "https://example.com/direct";
        assert_eq!(resolve_redirect(href), "https://example.com/direct");
    }

    #[test]
    fn protocol_relative_direct_link_gets_https() {
        let href = "//example.com/page";
        assert_eq!(resolve_redirect(href), "https://example.com/page");
    }

    #[test]
    fn redirect_without_uddg_param_keeps_wrapper() {
        let href = "https://duckduckgo.com/l/?rut=abc";
        assert_eq!(resolve_redirect(href), "https://duckduckgo.com/l/?rut=abc");
    }

    #[test]
    fn malformed_input_passes_through_unchanged() {
        assert_eq!(resolve_redirect("not-a-url"), "not-a-url");
        assert_eq!(resolve_redirect(""), "");
    }

    #[test]
    fn non_redirect_duckduckgo_path_untouched() {
        let href = "https://duckduckgo.com/about";
        assert_eq!(resolve_redirect(href), "https://duckduckgo.com/about");
    }
}
