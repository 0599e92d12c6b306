//! Streaming client for an Ollama-compatible generation backend.
//!
//! `/api/generate` streams NDJSON lines of the form
//! `{"response": "...", "done": false}`. The client reassembles lines across
//! transport chunks, forwards each non-empty token through a channel, and
//! reports failures through the same channel so the response stream can carry
//! a terminal diagnostic fragment instead of hanging.

use crate::config::BackendConfig;
use crate::error::{ChatError, Result};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for the model-list proxy call.
const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// One unit flowing from the backend reader to the response body.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMsg {
    /// A text token from the model, verbatim.
    Token(String),
    /// The backend signalled completion.
    Done,
    /// The backend failed; the message is suitable for display.
    Error(String),
}

/// Sampling options forwarded to the backend.
#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    repeat_penalty: f64,
    num_predict: u32,
    num_ctx: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
            num_predict: 2048,
            num_ctx: 4096,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// One NDJSON line of a streaming generate response.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Client for one Ollama-compatible backend.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    request_timeout: Duration,
}

impl OllamaClient {
    /// Build a client from backend settings.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Backend`] if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatError::Backend(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn endpoint_generate(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn endpoint_tags(&self) -> String {
        format!("{}/api/tags", self.base_url.trim_end_matches('/'))
    }

    /// Stream a generation, forwarding tokens until the backend is done.
    ///
    /// Never returns an error: failures are reported as a final
    /// [`StreamMsg::Error`] so the caller can write a terminal diagnostic
    /// fragment and close the channel. If the receiver is dropped (client
    /// disconnect), the backend response is dropped with it and no further
    /// tokens are pulled.
    pub async fn stream_generate(&self, prompt: &str, tx: mpsc::Sender<StreamMsg>) {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
            options: GenerateOptions::default(),
        };

        let response = match self
            .client
            .post(self.endpoint_generate())
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let _ = tx
                    .send(StreamMsg::Error(format!("backend unreachable: {err}")))
                    .await;
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let _ = tx
                .send(StreamMsg::Error(format!("backend HTTP {status}")))
                .await;
            return;
        }

        let mut body = response.bytes_stream();
        let mut lines = LineAssembler::default();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = tx
                        .send(StreamMsg::Error(format!("backend stream error: {err}")))
                        .await;
                    return;
                }
            };

            for line in lines.push(&chunk) {
                let parsed: GenerateChunk = match serde_json::from_slice(&line) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        tracing::debug!(error = %err, "skipping malformed backend line");
                        continue;
                    }
                };
                if !parsed.response.is_empty()
                    && tx.send(StreamMsg::Token(parsed.response)).await.is_err()
                {
                    // Receiver gone: the client disconnected mid-stream.
                    return;
                }
                if parsed.done {
                    let _ = tx.send(StreamMsg::Done).await;
                    return;
                }
            }
        }

        // Backend closed the connection without a done line.
        let _ = tx.send(StreamMsg::Done).await;
    }

    /// List models exposed by the backend, proxied unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Backend`] on any request or parse failure.
    pub async fn list_models(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(self.endpoint_tags())
            .timeout(MODEL_LIST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ChatError::Backend(format!("model list request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Backend(format!("model list HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| ChatError::Backend(format!("model list parse failed: {e}")))
    }
}

/// Splits a byte stream into complete newline-terminated lines.
///
/// Holds partial lines (including partial UTF-8 sequences inside them)
/// across chunks, so a token split mid-character by the transport survives
/// intact.
#[derive(Debug, Default)]
struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    /// Push a chunk and return the complete lines it closed, without their
    /// trailing newline. Empty lines are dropped.
    fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}
