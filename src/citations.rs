//! Citation extraction from generated text.
//!
//! The model is instructed to cite sources inline in one of two syntaxes:
//! the current `Source: [site-name - https://url]` and the legacy
//! `[Source N: site-name]` (resolved against the envelope by ordinal).
//! Presentation layers strip these from the display text and render a source
//! list. The parser lives here, independent of the streaming path, so the
//! citation-syntax compatibility story stays out of the core protocol.

/// One citation found in generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// The site name as written by the model.
    pub label: String,
    /// Absolute URL; current-format citations carry one, legacy do not.
    pub url: Option<String>,
    /// Envelope ordinal; legacy citations carry one, current do not.
    pub ordinal: Option<u32>,
}

/// Extract all citations from `text`, de-duplicated (by URL for the current
/// format, by ordinal for the legacy one), in order of first appearance.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();
    for (_, citation) in scan(text) {
        let duplicate = citations.iter().any(|existing| match (&citation.url, citation.ordinal) {
            (Some(url), _) => existing.url.as_deref() == Some(url),
            (None, Some(ordinal)) => existing.ordinal == Some(ordinal),
            (None, None) => false,
        });
        if !duplicate {
            citations.push(citation);
        }
    }
    citations
}

/// Remove citation markup from `text` and collapse the blank-line runs it
/// leaves behind.
pub fn strip_citations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, _) in scan(text) {
        out.push_str(&text[cursor..range.start]);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    collapse_blank_runs(&out)
}

/// Find every citation with its byte range, in text order.
fn scan(text: &str) -> Vec<(std::ops::Range<usize>, Citation)> {
    let mut found = Vec::new();
    let mut i = 0;
    while i < text.len() {
        if let Some((range, citation)) =
            match_current_at(text, i).or_else(|| match_legacy_at(text, i))
        {
            i = range.end;
            found.push((range, citation));
        } else {
            // Advance one character, not one byte.
            i += text[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    found
}

/// `Source: [site-name - https://url]`
fn match_current_at(text: &str, i: usize) -> Option<(std::ops::Range<usize>, Citation)> {
    const PREFIX: &str = "Source: [";
    let rest = text[i..].strip_prefix(PREFIX)?;
    let close = rest.find(']')?;
    let inner = &rest[..close];
    if inner.contains('\n') {
        return None;
    }
    let sep = inner.find(" - http")?;
    let url = inner[sep + 3..].trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return None;
    }
    let label = inner[..sep].trim();
    if label.is_empty() {
        return None;
    }
    let end = i + PREFIX.len() + close + 1;
    Some((
        i..end,
        Citation {
            label: label.to_owned(),
            url: Some(url.to_owned()),
            ordinal: None,
        },
    ))
}

/// `[Source N: site-name]`
fn match_legacy_at(text: &str, i: usize) -> Option<(std::ops::Range<usize>, Citation)> {
    const PREFIX: &str = "[Source ";
    let rest = text[i..].strip_prefix(PREFIX)?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let ordinal: u32 = rest[..digits].parse().ok()?;
    let after_ordinal = rest[digits..].strip_prefix(": ")?;
    let close = after_ordinal.find(']')?;
    let label = after_ordinal[..close].trim();
    if label.is_empty() || label.contains('\n') {
        return None;
    }
    let end = i + PREFIX.len() + digits + 2 + close + 1;
    Some((
        i..end,
        Citation {
            label: label.to_owned(),
            url: None,
            ordinal: Some(ordinal),
        },
    ))
}

/// Collapse runs of three or more newlines (possibly separated by other
/// whitespace) down to a single blank line.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    for ch in text.chars() {
        if ch == '\n' || (ch.is_whitespace() && !pending.is_empty()) {
            pending.push(ch);
            continue;
        }
        flush_separator(&mut out, &pending);
        pending.clear();
        out.push(ch);
    }
    flush_separator(&mut out, &pending);
    out
}

fn flush_separator(out: &mut String, pending: &str) {
    let newlines = pending.chars().filter(|&c| c == '\n').count();
    if newlines >= 2 {
        out.push_str("\n\n");
    } else {
        out.push_str(pending);
    }
}
