//! The wire protocol between the relay and its clients.
//!
//! One HTTP response body carries two payload types: a single delimited
//! metadata frame (the serialized [`crate::envelope::SearchEnvelope`]),
//! followed by raw model tokens with no further framing. Multiplexing is done
//! by ordering, not by per-chunk tags; demultiplexing is explicit buffered
//! delimiter scanning that tolerates arbitrary transport chunk boundaries.

pub mod demux;
pub mod framing;

pub use demux::{DemuxEvent, StreamDemux};
pub use framing::{encode_envelope, EncodedEnvelope, END_MARKER, START_MARKER};
