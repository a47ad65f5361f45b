//! Provider configuration
//!
//! Deserialized from the `[[providers]]` array of the CLI config file and
//! turned into a `ProviderChain` in declaration order.

use crate::{DynProvider, LlmError, MockProvider, OllamaProvider, OpenAiProvider, ProviderChain};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Supported backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
    /// Canned responses, no network
    Mock,
}

/// One configured provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend kind
    pub kind: ProviderKind,

    /// Name used in logs and for `--provider` preference; defaults to the kind
    #[serde(default)]
    pub name: Option<String>,

    /// API base URL; each kind has its own default
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model identifier
    #[serde(default)]
    pub model: String,

    /// Inline API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Canned response for `mock` providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

impl ProviderConfig {
    /// Name this provider reports
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| match self.kind {
            ProviderKind::Ollama => "ollama".to_string(),
            ProviderKind::OpenAi => "openai".to_string(),
            ProviderKind::Mock => "mock".to_string(),
        })
    }

    fn api_key(&self) -> Result<String, LlmError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        if let Some(var) = &self.api_key_env {
            return std::env::var(var)
                .map_err(|_| LlmError::Authentication(format!("environment variable {} is not set", var)));
        }
        Err(LlmError::Authentication("no api_key or api_key_env configured".to_string()))
    }

    /// Build the configured provider
    pub fn build(&self) -> Result<DynProvider, LlmError> {
        let name = self.display_name();
        let timeout = Duration::from_secs(self.timeout_secs);

        let provider: DynProvider = match self.kind {
            ProviderKind::Ollama => {
                if self.model.is_empty() {
                    return Err(LlmError::ModelNotAvailable("no model configured".to_string()));
                }
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::ollama::DEFAULT_ENDPOINT.to_string());
                Box::new(
                    OllamaProvider::new(endpoint, &self.model)
                        .with_name(name)
                        .with_timeout(timeout),
                )
            }
            ProviderKind::OpenAi => {
                if self.model.is_empty() {
                    return Err(LlmError::ModelNotAvailable("no model configured".to_string()));
                }
                let endpoint = self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::openai::DEFAULT_ENDPOINT.to_string());
                Box::new(
                    OpenAiProvider::new(endpoint, &self.model, self.api_key()?)?
                        .with_name(name)
                        .with_timeout(timeout),
                )
            }
            ProviderKind::Mock => Box::new(
                MockProvider::new(self.response.clone().unwrap_or_else(|| "[]".to_string())).with_name(name),
            ),
        };

        Ok(provider)
    }
}

/// Build a chain from provider configs in priority order
///
/// Providers that cannot be constructed (missing model, missing credentials)
/// are skipped with a warning; the caller decides whether an empty chain is
/// acceptable.
pub fn build_chain(configs: &[ProviderConfig]) -> ProviderChain {
    let mut chain = ProviderChain::new();
    for config in configs {
        match config.build() {
            Ok(provider) => chain.push(provider),
            Err(e) => warn!(provider = %config.display_name(), reason = %e, "skipping provider"),
        }
    }
    chain
}
