//! HTTP front-end for the relay.
//!
//! Exposes the prompt-submission endpoint and the model-list proxy. The
//! generate handler is the stream multiplexer: it writes the metadata frame
//! first, then pipes backend tokens onto the same channel verbatim, and on
//! upstream failure appends a short diagnostic fragment before closing.
//!
//! ## Endpoints
//!
//! - `POST /api/generate` — search-augmented streaming generation
//! - `GET /api/models` — backend model list, proxied unchanged

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::Result;
use crate::ollama::{OllamaClient, StreamMsg};
use crate::protocol::framing::encode_envelope;
use crate::search::SearchOrchestrator;

/// Capacity of the channel between the backend reader and the response body.
/// A full channel back-pressures the reader.
const TOKEN_CHANNEL_CAP: usize = 64;

/// Fixed diagnostic body for model-list proxy failures.
const MODELS_ERROR_MESSAGE: &str = "unable to retrieve models";

static METADATA_HEADER: HeaderName = HeaderName::from_static("x-search-metadata");

/// Prompt-submission request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The user's free-text prompt. No other fields are required.
    pub prompt: String,
}

/// Shared state for axum handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    orchestrator: Arc<SearchOrchestrator>,
    ollama: OllamaClient,
}

/// The relay's HTTP server.
///
/// Binds on construction (use port `0` for auto-assign in tests) and serves
/// from a background task until shut down or dropped.
pub struct ChatServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ChatServer {
    /// Validate the configuration, bind, and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the listener
    /// cannot bind.
    pub async fn start(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let state = AppState {
            orchestrator: Arc::new(SearchOrchestrator::new(&config.search)),
            ollama: OllamaClient::new(&config.backend)?,
            config: Arc::new(config),
        };

        let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
        let app = router(state);

        let listener = TcpListener::bind(&bind_addr).await?;
        let addr = listener.local_addr()?;

        info!("chat relay listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ChatServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/generate",
            post(handle_generate).options(handle_preflight),
        )
        .route("/api/models", get(handle_models))
        .with_state(state)
}

/// `GET /api/models` — proxy the backend's model list unchanged.
async fn handle_models(State(state): State<AppState>) -> Response {
    match state.ollama.list_models().await {
        Ok(models) => Json(models).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "model list proxy failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": MODELS_ERROR_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// CORS preflight for the browser client.
async fn handle_preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

/// `POST /api/generate` — the multiplexed streaming response.
///
/// Orchestration is fully awaited before the first byte is written; the body
/// is exactly one metadata frame followed by the backend's tokens in order.
async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    info!(%request_id, "generation request");

    let augmented = state.orchestrator.augment(&request.prompt).await;

    let encoded = match encode_envelope(&augmented.envelope) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::error!(%request_id, error = %err, "envelope encoding failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "metadata encoding failed")
                .into_response();
        }
    };

    let full_prompt = format!(
        "{}\n\n{}",
        state.config.backend.system_prompt, augmented.augmented_prompt
    );

    let (tx, mut rx) = mpsc::channel::<StreamMsg>(TOKEN_CHANNEL_CAP);
    let ollama = state.ollama.clone();
    tokio::spawn(async move {
        ollama.stream_generate(&full_prompt, tx).await;
    });

    let frame = encoded.frame;
    let body_stream = async_stream::stream! {
        yield Ok::<Bytes, Infallible>(Bytes::from(frame));
        while let Some(msg) = rx.recv().await {
            match msg {
                StreamMsg::Token(token) => yield Ok(Bytes::from(token)),
                StreamMsg::Done => {
                    tracing::debug!(%request_id, "generation complete");
                    break;
                }
                StreamMsg::Error(message) => {
                    tracing::error!(%request_id, error = %message, "generation failed");
                    yield Ok(Bytes::from(format!("generation error: {message}")));
                    break;
                }
            }
        }
    };

    let mut response = Response::new(Body::from_stream(body_stream));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Ok(value) = HeaderValue::from_str(&encoded.header_value) {
        headers.insert(METADATA_HEADER.clone(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_round_trip() {
        let request = GenerateRequest {
            prompt: "What is the capital of France?".into(),
        };
        let json = serde_json::to_string(&request).expect("serialize");
        let parsed: GenerateRequest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.prompt, "What is the capital of France?");
    }

    #[test]
    fn generate_request_rejects_missing_prompt() {
        let result = serde_json::from_str::<GenerateRequest>("{}");
        assert!(result.is_err());
    }

    #[test]
    fn metadata_header_name_is_lowercase() {
        assert_eq!(METADATA_HEADER.as_str(), "x-search-metadata");
    }

    #[test]
    fn models_error_message_is_stable() {
        assert_eq!(MODELS_ERROR_MESSAGE, "unable to retrieve models");
    }
}
