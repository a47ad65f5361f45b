//! OpenAI-compatible chat completions provider
//!
//! Works against any server exposing `POST {endpoint}/chat/completions` with
//! bearer authentication (OpenAI, Azure-style gateways, vLLM, LM Studio).

use crate::{run_blocking, status_error, transport_error, LlmError};
use rfp_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature for every request
const TEMPERATURE: f32 = 0.0;

/// Provider for OpenAI-compatible chat completion APIs
pub struct OpenAiProvider {
    name: String,
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider
    ///
    /// A blank API key is rejected up front as malformed credentials.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Authentication("API key is empty".to_string()));
        }
        Ok(Self {
            name: "openai".to_string(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }

    /// Set the provider name reported in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Generate a chat completion for a single user message
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
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

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no message content".to_string()))
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        run_blocking(OpenAiProvider::generate(self, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_api_key() {
        let result = OpenAiProvider::new(DEFAULT_ENDPOINT, "gpt-4o-mini", "  ");
        assert!(matches!(result, Err(LlmError::Authentication(_))));
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("http://localhost:8000/v1/", "qwen", "sk-test")
            .unwrap()
            .with_name("vllm");
        assert_eq!(provider.endpoint, "http://localhost:8000/v1");
        assert_eq!(provider.model, "qwen");
        assert_eq!(LlmProviderTrait::name(&provider), "vllm");
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [ChatMessage { role: "user", content: "hello" }],
            temperature: 0.0,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["temperature"], 0.0);
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let provider = OpenAiProvider::new("http://localhost:99999/v1", "m", "sk-test").unwrap();
        let result = provider.generate("test").await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
