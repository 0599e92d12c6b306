//! Metadata frame encoding for the outbound stream.
//!
//! The frame is `__SEARCH_METADATA__<json>__END_METADATA__\n`, written once
//! at the start of the response body. The same serialization, URL-encoded,
//! is mirrored into the `X-Search-Metadata` header for clients that prefer
//! header-based metadata; both views always describe the same envelope.

use crate::envelope::SearchEnvelope;
use crate::error::{ChatError, Result};

/// Marks the start of the serialized envelope within the response body.
pub const START_MARKER: &str = "__SEARCH_METADATA__";

/// Marks the end of the serialized envelope.
pub const END_MARKER: &str = "__END_METADATA__";

/// Both wire renderings of one envelope.
#[derive(Debug, Clone)]
pub struct EncodedEnvelope {
    /// The in-body frame, including the trailing newline.
    pub frame: String,
    /// URL-encoded JSON for the `X-Search-Metadata` header.
    pub header_value: String,
}

/// Serialize an envelope into its frame and header renderings.
///
/// # Errors
///
/// Returns [`ChatError::Protocol`] if the envelope cannot be serialized.
pub fn encode_envelope(envelope: &SearchEnvelope) -> Result<EncodedEnvelope> {
    let json = serde_json::to_string(envelope)
        .map_err(|e| ChatError::Protocol(format!("envelope serialization failed: {e}")))?;

    let header_value = urlencoding::encode(&json).into_owned();
    let body_json = escape_markers(&json);
    let frame = format!("{START_MARKER}{body_json}{END_MARKER}\n");

    Ok(EncodedEnvelope {
        frame,
        header_value,
    })
}

/// Rewrite any delimiter occurrence inside serialized JSON so the byte
/// stream can never contain a false delimiter.
///
/// The markers consist of letters and underscores, so inside valid JSON they
/// can only occur within string literals, where `_` spells the same
/// underscore. Every underscore of a matched marker is rewritten, leaving the
/// replacement with no underscores at all, so no new marker can form across
/// a replacement boundary. Parsing restores the identical envelope.
pub fn escape_markers(json: &str) -> String {
    let escaped_start = START_MARKER.replace('_', "\\u005f");
    let escaped_end = END_MARKER.replace('_', "\\u005f");
    json.replace(START_MARKER, &escaped_start)
        .replace(END_MARKER, &escaped_end)
}
