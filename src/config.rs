//! Configuration for the relay: server binding, generation backend, search.
//!
//! Everything is optional with defaults matching a local Ollama setup. A TOML
//! file can override any section, and a handful of environment variables
//! override the file so container deployments need no config at all.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default system prompt sent ahead of every augmented prompt.
///
/// Instructs the model on citation syntax so the presentation layer can
/// extract a source list from the generated text.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an AI assistant with web access.

=== SEARCH AND SOURCES ===
- Structured web search data may follow the user's message
- ALWAYS provide the full URLs of the sources you used
- Citation format: [Source: site-name - FULL_URL]
- Example: [Source: Wikipedia - https://en.wikipedia.org/wiki/Riemann_hypothesis]

=== STYLE ===
- Answer in the user's language
- Concise by default; elaborate only when asked
- Prefer current information

=== FORMATTING ===
- Use bullet points (\u{2022}) where they add clarity
- Leave a blank line between important points
- No rigid structure imposed";

/// Top-level configuration for the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Generation backend settings.
    pub backend: BackendConfig,
    /// Web search settings.
    pub search: SearchSettings,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind (0 = auto-assign, useful in tests).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3001,
        }
    }
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the Ollama-compatible backend.
    pub base_url: String,
    /// Model name passed to the backend.
    pub model: String,
    /// System prompt prepended to every augmented prompt.
    pub system_prompt: String,
    /// Upper bound on a single generation call, in seconds. Expiry surfaces
    /// as a terminal error fragment on the stream, never a hang.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_owned(),
            model: "mistral:latest".to_owned(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            request_timeout_secs: 30,
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum sources kept in one envelope.
    pub max_results: usize,
    /// Per-request provider timeout in seconds.
    pub timeout_secs: u64,
    /// Structured-lookup endpoint override (`None` = provider default).
    pub api_endpoint: Option<String>,
    /// HTML fallback endpoint override (`None` = provider default).
    pub html_endpoint: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 8,
            api_endpoint: None,
            html_endpoint: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|e| ChatError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Apply environment-variable overrides on top of the current values.
    ///
    /// Recognised variables: `OLLAMA_URL`, `YNER_MODEL`, `SYSTEM_PROMPT`,
    /// `YNER_HOST`, `YNER_PORT`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_var("OLLAMA_URL") {
            self.backend.base_url = url;
        }
        if let Some(model) = env_var("YNER_MODEL") {
            self.backend.model = model;
        }
        if let Some(prompt) = env_var("SYSTEM_PROMPT") {
            self.backend.system_prompt = prompt;
        }
        if let Some(host) = env_var("YNER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_var("YNER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Validate the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ChatError::Config("server.host must not be empty".into()));
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(ChatError::Config(
                "backend.base_url must not be empty".into(),
            ));
        }
        if self.backend.model.trim().is_empty() {
            return Err(ChatError::Config("backend.model must not be empty".into()));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ChatError::Config(
                "backend.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ChatError::Config(
                "search.max_results must be greater than 0".into(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(ChatError::Config(
                "search.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
