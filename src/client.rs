//! Consuming side of the stream protocol.
//!
//! Posts a prompt to a relay and demultiplexes the response body into the
//! metadata envelope and the display text. The read loop is strictly
//! sequential: one reader, chunks processed in arrival order, no concurrent
//! mutation of the accumulating text.

use crate::envelope::SearchEnvelope;
use crate::error::{ChatError, Result};
use crate::protocol::demux::{DemuxEvent, StreamDemux};
use futures_util::StreamExt;

/// A fully-consumed generation response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The parsed metadata envelope, if the stream carried one.
    pub envelope: Option<SearchEnvelope>,
    /// All display text, in arrival order.
    pub text: String,
}

/// Client for a yner relay.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Build a client for the relay at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Backend`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatError::Backend(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Send a prompt and collect the full demultiplexed response.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Backend`] on transport failures or non-success
    /// statuses. A malformed metadata frame is not an error; the envelope is
    /// simply absent.
    pub async fn generate(&self, prompt: &str) -> Result<ChatResponse> {
        self.generate_with(prompt, |_| {}).await
    }

    /// Like [`generate`](Self::generate), invoking `on_text` for every
    /// display-text fragment as it arrives.
    pub async fn generate_with(
        &self,
        prompt: &str,
        mut on_text: impl FnMut(&str),
    ) -> Result<ChatResponse> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ChatError::Backend(format!("generate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Backend(format!("generate HTTP {status}")));
        }

        let mut demux = StreamDemux::new();
        let mut envelope = None;
        let mut text = String::new();

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| ChatError::Backend(format!("response stream error: {e}")))?;
            for event in demux.push(&chunk) {
                match event {
                    DemuxEvent::Metadata(env) => envelope = Some(env),
                    DemuxEvent::Text(fragment) => {
                        on_text(&fragment);
                        text.push_str(&fragment);
                    }
                }
            }
        }
        for event in demux.finish() {
            match event {
                DemuxEvent::Metadata(env) => envelope = Some(env),
                DemuxEvent::Text(fragment) => {
                    on_text(&fragment);
                    text.push_str(&fragment);
                }
            }
        }

        Ok(ChatResponse { envelope, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction() {
        let client = ChatClient::new("http://127.0.0.1:3001").expect("client");
        assert_eq!(client.base_url, "http://127.0.0.1:3001");
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_backend_error() {
        let client = ChatClient::new("http://127.0.0.1:9").expect("client");
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Backend(_)));
    }
}
