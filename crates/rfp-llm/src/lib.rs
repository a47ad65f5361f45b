//! RFP LLM Provider Layer
//!
//! Pluggable text-generation backends behind the `LlmProvider` trait from
//! `rfp-domain`, plus the ordered fallback chain the extractor talks to.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing and offline runs
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: Any OpenAI-compatible chat completions endpoint
//! - `ProviderChain`: Tries providers in priority order until one succeeds
//!
//! # Examples
//!
//! ```
//! use rfp_llm::{LlmError, MockProvider, ProviderChain};
//! use rfp_domain::traits::LlmProvider;
//!
//! let chain = ProviderChain::new()
//!     .with_provider(MockProvider::failing("primary", LlmError::RateLimitExceeded))
//!     .with_provider(MockProvider::new("[]").with_name("backup"));
//!
//! assert_eq!(chain.generate("test prompt").unwrap(), "[]");
//! ```

#![warn(missing_docs)]

pub mod chain;
pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;

use std::fmt;
use std::future::Future;
use thiserror::Error;

pub use chain::ProviderChain;
pub use config::{build_chain, ProviderConfig, ProviderKind};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// A provider usable inside a [`ProviderChain`]
pub type DynProvider = Box<dyn rfp_domain::traits::LlmProvider<Error = LlmError> + Send + Sync>;

/// One failed provider attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Provider name
    pub provider: String,
    /// Why the attempt failed
    pub reason: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Errors that can occur during LLM operations
///
/// Every variant except `AllProvidersExhausted` describes a single provider
/// being unavailable, which the chain recovers from by falling back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Missing, malformed or rejected credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Every configured provider failed
    #[error("All providers exhausted: {}", describe_attempts(.attempts))]
    AllProvidersExhausted {
        /// Failed attempts in the order they were made
        attempts: Vec<ProviderFailure>,
    },

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether an immediate re-attempt against the same provider may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::Timeout(_))
    }
}

fn describe_attempts(attempts: &[ProviderFailure]) -> String {
    if attempts.is_empty() {
        return "no providers configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Map a reqwest transport error onto the provider error taxonomy
pub(crate) fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(e.to_string())
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

/// Map a non-success HTTP status onto the provider error taxonomy
pub(crate) fn status_error(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Authentication(format!("HTTP {}: {}", status, body)),
        404 => LlmError::ModelNotAvailable(model.to_string()),
        429 => LlmError::RateLimitExceeded,
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Drive an async provider call to completion from synchronous code
///
/// Must be called from a thread that is not already driving a runtime, such
/// as a `spawn_blocking` worker or a plain thread.
pub(crate) fn run_blocking<F, T>(future: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
    runtime.block_on(future)
}
