//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API, for running tender
//! documents through a local model without sending them to a third party.
//!
//! # Features
//!
//! - Async HTTP communication with Ollama API
//! - Configurable endpoint, model and request timeout
//! - Synchronous `LlmProvider` wrapper for use inside a `ProviderChain`
//!
//! # Examples
//!
//! ```no_run
//! use rfp_llm::OllamaProvider;
//!
//! // Create an Ollama provider
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3");
//!
//! // Note: The inherent generate method is async; the LlmProvider trait
//! // provides the blocking wrapper used by the provider chain
//! ```

use crate::{run_blocking, status_error, transport_error, LlmError};
use rfp_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    name: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            name: "ollama".to_string(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: build_client(timeout),
            timeout,
        }
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the provider name reported in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// Generate text using Ollama API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - The request times out
    /// - Response format is invalid
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, error_text, &self.model));
        }

        response
            .json::<OllamaGenerateResponse>()
            .await
            .map(|r| r.response)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        run_blocking(OllamaProvider::generate(self, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model, "llama3");
        assert_eq!(provider.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model, "mistral");
        assert_eq!(LlmProviderTrait::name(&provider), "ollama");
    }

    #[test]
    fn test_ollama_provider_builders() {
        let provider = OllamaProvider::default_endpoint("llama3")
            .with_name("local")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(provider.name, "local");
        assert_eq!(provider.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_request_disables_streaming() {
        let body = OllamaGenerateRequest {
            model: "llama3",
            prompt: "p",
            stream: false,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "llama3");
        assert_eq!(value["stream"], false);
    }

    // Integration tests (requires running Ollama)
    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_generate_integration() {
        let provider = OllamaProvider::default_endpoint("llama3");
        let result = provider.generate("Say 'hello' and nothing else").await;

        if let Ok(response) = result {
            assert!(!response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Use invalid endpoint to trigger error
        let provider = OllamaProvider::new("http://localhost:99999", "llama3");

        let result = provider.generate("test").await;
        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_blocking_wrapper_reports_failure() {
        let provider = OllamaProvider::new("http://localhost:99999", "llama3");
        let result = LlmProviderTrait::generate(&provider, "test");
        assert!(result.unwrap_err().is_transient());
    }
}
