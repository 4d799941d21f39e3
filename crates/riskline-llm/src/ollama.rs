//! Ollama chat client
//!
//! Talks to a local Ollama server over its `/api/chat` endpoint with
//! `format: "json"` so the model answers in machine-parseable JSON, and
//! probes `/api/tags` for reachability.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use riskline_core::METRICS;

use crate::client::{ModelClient, ModelConfig, ModelRequest};
use crate::error::ModelError;

/// Timeout for the reachability probe, independent of the request timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama-backed model client
pub struct OllamaClient {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: ModelConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("riskline/0.2.0")
            .build()
            .expect("Failed to create HTTP client");

        OllamaClient { config, http }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(ModelConfig::from_env())
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn transport_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            ModelError::ServiceUnavailable {
                reason: err.to_string(),
            }
        }
    }
}

/// Build the `/api/chat` request body for one prompt pair.
fn chat_payload(config: &ModelConfig, request: &ModelRequest) -> Value {
    serde_json::json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": request.system},
            {"role": "user", "content": request.prompt},
        ],
        "stream": false,
        "format": "json",
        "options": {
            "temperature": config.temperature,
            "num_predict": config.max_tokens,
        }
    })
}

/// Extract `message.content` from a chat response body and parse it as JSON.
fn decode_content(body: &Value) -> Result<Value, ModelError> {
    let content = body
        .pointer("/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::MalformedResponse {
            reason: "response has no message.content".to_string(),
        })?;

    serde_json::from_str(content).map_err(|err| ModelError::MalformedResponse {
        reason: format!("message.content is not JSON: {err}"),
    })
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, request: ModelRequest) -> Result<Value, ModelError> {
        let url = format!("{}/api/chat", self.config.base_url);
        let payload = chat_payload(&self.config, &request);

        debug!(
            model = %self.config.model,
            prompt_bytes = request.prompt.len(),
            "sending model request"
        );
        METRICS.inc_model_calls();

        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "model service rejected request");
            return Err(ModelError::ServiceUnavailable {
                reason: format!("model service returned {}", response.status()),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ModelError::MalformedResponse {
                reason: err.to_string(),
            })?;

        decode_content(&body)
    }

    async fn check_connection(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
