//! Model client abstraction
//!
//! `ModelClient` is the seam between the pipeline stages and whatever
//! actually serves the model. The production implementation talks to a
//! local Ollama endpoint; tests inject `fakes::ScriptedModelClient`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One prompt pair sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// System prompt establishing the analyst role and rating scales
    pub system: String,
    /// Stage-specific user prompt
    pub prompt: String,
}

impl ModelRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// Model service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the model service
    pub base_url: String,
    /// Model name to request
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature (lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens the model may generate per response
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            base_url: std::env::var("RISKLINE_MODEL_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("RISKLINE_MODEL").unwrap_or_else(|_| "qwen3:4b".to_string()),
            timeout_secs: std::env::var("RISKLINE_MODEL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

impl ModelConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific endpoint and model
    pub fn new(base_url: &str, model: &str) -> Self {
        ModelConfig {
            base_url: base_url.to_string(),
            model: model.to_string(),
            ..Self::from_env()
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Async client for the model service.
///
/// Guarantees:
/// - `generate` returns the model's answer already parsed as JSON, or a
///   `ModelError` describing why it could not.
/// - `check_connection` never errors; unreachable simply means `false`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt pair and return the parsed JSON answer.
    async fn generate(&self, request: ModelRequest) -> Result<serde_json::Value, ModelError>;

    /// Probe whether the model service is reachable.
    async fn check_connection(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ModelConfig::default();
        assert!(!config.base_url.is_empty());
        assert!(!config.model.is_empty());
        assert_eq!(config.max_tokens, 500);
    }

    #[test]
    fn test_config_new() {
        let config = ModelConfig::new("http://workcell-7:11434", "llama3.2:3b");
        assert_eq!(config.base_url, "http://workcell-7:11434");
        assert_eq!(config.model, "llama3.2:3b");
    }

    #[test]
    fn test_config_with_timeout() {
        let config = ModelConfig::default().with_timeout_secs(30);
        assert_eq!(config.timeout_secs, 30);
    }
}
