//! Deterministic mock provider

use crate::LlmError;
use rfp_domain::traits::LlmProvider;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

impl MockReply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(err) => Err(err),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    exact: HashMap<String, MockReply>,
    containing: Vec<(String, MockReply)>,
    queued: VecDeque<MockReply>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network
/// calls. Replies are resolved in this order: queued one-shot replies, exact
/// prompt matches, substring matches (in insertion order), then the default.
///
/// # Examples
///
/// ```
/// use rfp_llm::MockProvider;
/// use rfp_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Multiple responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_response_containing("uptime", "response2");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// assert_eq!(provider.generate("99.9% uptime").unwrap(), "response2");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    default_reply: MockReply,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            default_reply: MockReply::Text(response.into()),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a provider that fails every call with `error`
    pub fn failing(name: impl Into<String>, error: LlmError) -> Self {
        Self {
            name: name.into(),
            default_reply: MockReply::Fail(error),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the provider name reported to the chain
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.state().exact.insert(prompt.into(), MockReply::Text(response.into()));
    }

    /// Respond with `response` whenever the prompt contains `needle`
    pub fn add_response_containing(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.state()
            .containing
            .push((needle.into(), MockReply::Text(response.into())));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.state()
            .exact
            .insert(prompt.into(), MockReply::Fail(LlmError::Other("Mock error".to_string())));
    }

    /// Fail with `error` whenever the prompt contains `needle`
    pub fn add_error_containing(&mut self, needle: impl Into<String>, error: LlmError) {
        self.state().containing.push((needle.into(), MockReply::Fail(error)));
    }

    /// Queue a one-shot failure consumed by the next call
    pub fn queue_error(&self, error: LlmError) {
        self.state().queued.push_back(MockReply::Fail(error));
    }

    /// Queue a one-shot response consumed by the next call
    pub fn queue_response(&self, response: impl Into<String>) {
        self.state().queued.push_back(MockReply::Text(response.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not poison the shared mock for others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());

        if let Some(reply) = state.queued.pop_front() {
            return reply.into_result();
        }

        if let Some(reply) = state.exact.get(prompt) {
            return reply.clone().into_result();
        }

        if let Some((_, reply)) = state
            .containing
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return reply.clone().into_result();
        }

        self.default_reply.clone().into_result()
    }
}
