//! Incremental demultiplexer for the response stream.
//!
//! Feed chunks of bytes via [`StreamDemux::push`] as they arrive and collect
//! the emitted events; call [`StreamDemux::finish`] when the stream closes.
//! Chunk boundaries carry no meaning: delimiters and multi-byte characters
//! split across chunks are reassembled before anything is emitted.

use crate::envelope::SearchEnvelope;
use crate::protocol::framing::{END_MARKER, START_MARKER};

/// Upper bound on a buffered metadata frame. A frame that has not terminated
/// within this window is abandoned and its bytes are replayed as text.
const MAX_FRAME_BYTES: usize = 64 * 1024;

/// One demultiplexed unit of the response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DemuxEvent {
    /// The parsed metadata envelope. Emitted at most once per stream.
    Metadata(SearchEnvelope),
    /// A fragment of display text, in arrival order.
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Deciding whether the stream begins with a metadata frame.
    Sniffing,
    /// Start marker seen; buffering until the end marker arrives.
    Framed,
    /// Frame consumed (or absent); every byte is display text.
    Passthrough,
}

/// Incremental stream demultiplexer.
///
/// Maintains internal buffer state across [`push`](Self::push) calls. The
/// metadata frame is recognised only at the very start of the stream (which
/// is where the multiplexer writes it); a stream that begins with anything
/// else degrades to pure text from the first byte.
#[derive(Debug)]
pub struct StreamDemux {
    state: State,
    buf: Vec<u8>,
    /// The frame's trailing newline has not been consumed yet.
    newline_pending: bool,
}

impl Default for StreamDemux {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDemux {
    /// Create a new demultiplexer for one response stream.
    pub fn new() -> Self {
        Self {
            state: State::Sniffing,
            buf: Vec::new(),
            newline_pending: false,
        }
    }

    /// Push a chunk of bytes into the demultiplexer.
    ///
    /// Returns the events completed by this chunk, possibly none.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DemuxEvent> {
        self.buf.extend_from_slice(chunk);
        self.drain()
    }

    /// Signal end of stream and flush whatever remains.
    ///
    /// An incomplete metadata frame is discarded (logged); buffered text is
    /// emitted, decoding any dangling partial character lossily.
    pub fn finish(&mut self) -> Vec<DemuxEvent> {
        match self.state {
            State::Sniffing | State::Framed => {
                if !self.buf.is_empty() {
                    tracing::warn!(
                        bytes = self.buf.len(),
                        "stream ended inside an incomplete metadata frame; discarding"
                    );
                    self.buf.clear();
                }
                self.state = State::Passthrough;
                Vec::new()
            }
            State::Passthrough => {
                let mut events = Vec::new();
                self.consume_pending_newline();
                if !self.buf.is_empty() {
                    let text = String::from_utf8_lossy(&self.buf).into_owned();
                    self.buf.clear();
                    events.push(DemuxEvent::Text(text));
                }
                events
            }
        }
    }

    fn drain(&mut self) -> Vec<DemuxEvent> {
        let mut events = Vec::new();
        loop {
            match self.state {
                State::Sniffing => {
                    let marker = START_MARKER.as_bytes();
                    if self.buf.len() < marker.len() {
                        if marker.starts_with(&self.buf) {
                            // Could still become a frame; wait for more bytes.
                            return events;
                        }
                        self.state = State::Passthrough;
                    } else if self.buf.starts_with(marker) {
                        self.state = State::Framed;
                    } else {
                        self.state = State::Passthrough;
                    }
                }
                State::Framed => {
                    let start_len = START_MARKER.len();
                    let end = END_MARKER.as_bytes();
                    if let Some(pos) = find_subslice(&self.buf[start_len..], end) {
                        let payload = &self.buf[start_len..start_len + pos];
                        match serde_json::from_slice::<SearchEnvelope>(payload) {
                            Ok(envelope) => events.push(DemuxEvent::Metadata(envelope)),
                            Err(err) => tracing::warn!(
                                error = %err,
                                "metadata frame failed to parse; continuing without it"
                            ),
                        }
                        self.buf.drain(..start_len + pos + end.len());
                        self.newline_pending = true;
                        self.state = State::Passthrough;
                    } else if self.buf.len() > MAX_FRAME_BYTES {
                        tracing::warn!(
                            bytes = self.buf.len(),
                            "metadata frame never terminated; replaying buffered bytes as text"
                        );
                        self.state = State::Passthrough;
                    } else {
                        return events;
                    }
                }
                State::Passthrough => {
                    self.consume_pending_newline();
                    if self.newline_pending {
                        // Buffer ran dry before the newline arrived.
                        return events;
                    }
                    if let Some(text) = self.drain_text() {
                        events.push(DemuxEvent::Text(text));
                    }
                    return events;
                }
            }
        }
    }

    /// Swallow the single newline that terminates the frame, once it arrives.
    fn consume_pending_newline(&mut self) {
        if !self.newline_pending || self.buf.is_empty() {
            return;
        }
        if self.buf[0] == b'\n' {
            self.buf.remove(0);
        }
        self.newline_pending = false;
    }

    /// Decode the buffered bytes up to the last complete UTF-8 sequence.
    ///
    /// A partial multi-byte sequence at the tail is held back for the next
    /// chunk; truly invalid bytes become U+FFFD.
    fn drain_text(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }

        let mut out = String::new();
        let mut cursor = 0usize;
        loop {
            match std::str::from_utf8(&self.buf[cursor..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    cursor = self.buf.len();
                    break;
                }
                Err(err) => {
                    let valid_end = cursor + err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.buf[cursor..valid_end]) {
                        out.push_str(valid);
                    }
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push('\u{FFFD}');
                            cursor = valid_end + invalid_len;
                        }
                        None => {
                            // Incomplete tail sequence: hold it back.
                            cursor = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.buf.drain(..cursor);
        if out.is_empty() { None } else { Some(out) }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
