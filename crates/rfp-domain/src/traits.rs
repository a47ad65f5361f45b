//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use std::time::Instant;

/// Trait for text-generation backends
///
/// Implemented by the infrastructure layer (rfp-llm). A provider either
/// returns the raw completion text or fails; callers decide whether to fall
/// back to another provider.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Short provider name used in logs and fallback diagnostics
    fn name(&self) -> &str;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate text, starting no new backend request after `deadline`
    ///
    /// A request already in flight runs to its own timeout. Single providers
    /// have nothing to stop early and just call `generate`.
    fn generate_by(&self, prompt: &str, deadline: Instant) -> Result<String, Self::Error> {
        let _ = deadline;
        self.generate(prompt)
    }
}

impl<P: LlmProvider + ?Sized> LlmProvider for Box<P> {
    type Error = P::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        (**self).generate(prompt)
    }

    fn generate_by(&self, prompt: &str, deadline: Instant) -> Result<String, Self::Error> {
        (**self).generate_by(prompt, deadline)
    }
}
