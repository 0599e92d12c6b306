//! Yner: search-augmented chat relay.
//!
//! Every prompt is augmented with a best-effort web search before being
//! relayed to a local Ollama-compatible backend. The response is a single
//! streaming channel carrying two payload types: one delimited metadata
//! frame (the search-result envelope), then the model's tokens verbatim.
//!
//! # Architecture
//!
//! The pipeline is linear per request:
//! prompt → search orchestrator → augmented prompt → backend →
//! stream multiplexer → network → stream demultiplexer → text + envelope
//!
//! - **Orchestrator** ([`search`]): cleans the prompt into a query, calls the
//!   provider, builds the envelope, renders the augmentation block
//! - **Multiplexer** ([`server`] + [`protocol::framing`]): one frame, then
//!   tokens, multiplexed by ordering rather than per-chunk tags
//! - **Demultiplexer** ([`protocol::demux`] + [`client`]): buffered delimiter
//!   scanning that tolerates arbitrary chunk boundaries

pub mod citations;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ollama;
pub mod protocol;
pub mod search;
pub mod server;

pub use client::{ChatClient, ChatResponse};
pub use config::AppConfig;
pub use envelope::{SearchEnvelope, SearchSource};
pub use error::{ChatError, Result};
pub use protocol::{DemuxEvent, StreamDemux};
pub use server::ChatServer;
