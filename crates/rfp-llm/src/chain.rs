//! Ordered provider fallback
//!
//! A `ProviderChain` is itself an `LlmProvider`: callers never branch on
//! which backend is configured, they hand the chain a prompt and get either
//! text or `AllProvidersExhausted`.
//!
//! Through `generate_by` the chain also honours a deadline: once it has
//! passed, remaining providers are skipped instead of called.

use crate::{DynProvider, LlmError, ProviderFailure};
use rfp_domain::traits::LlmProvider;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Providers tried in priority order until one succeeds
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<DynProvider>,
    preferred: Option<String>,
}

impl ProviderChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority
    pub fn with_provider<P>(mut self, provider: P) -> Self
    where
        P: LlmProvider<Error = LlmError> + Send + Sync + 'static,
    {
        self.push(Box::new(provider));
        self
    }

    /// Try the provider called `name` first on every `generate` call
    pub fn prefer(mut self, name: impl Into<String>) -> Self {
        self.preferred = Some(name.into());
        self
    }

    /// Append an already boxed provider at the lowest priority
    pub fn push(&mut self, provider: DynProvider) {
        self.providers.push(provider);
    }

    /// Number of configured providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is configured
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Generate text, trying `preferred` first when it names a configured
    /// provider and the remaining providers in their configured order after it
    pub fn generate_with_preference(
        &self,
        prompt: &str,
        preferred: Option<&str>,
    ) -> Result<String, LlmError> {
        self.run(prompt, preferred, None)
    }

    fn run(
        &self,
        prompt: &str,
        preferred: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<String, LlmError> {
        let mut attempts = Vec::new();

        for provider in self.ordered(preferred) {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(provider = provider.name(), "time budget spent, skipping provider");
                attempts.push(ProviderFailure {
                    provider: provider.name().to_string(),
                    reason: "time budget spent".to_string(),
                });
                continue;
            }

            match attempt(&**provider, prompt, deadline) {
                Ok(text) => {
                    debug!(provider = provider.name(), "provider succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(provider = provider.name(), reason = %e, "provider failed, falling back");
                    attempts.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(LlmError::AllProvidersExhausted { attempts })
    }

    fn ordered(&self, preferred: Option<&str>) -> Vec<&DynProvider> {
        let mut ordered: Vec<&DynProvider> = self.providers.iter().collect();

        if let Some(name) = preferred {
            match ordered.iter().position(|p| p.name() == name) {
                Some(idx) => {
                    let first = ordered.remove(idx);
                    ordered.insert(0, first);
                }
                None => info!(preferred = name, "preferred provider not configured, using default order"),
            }
        }

        ordered
    }
}

/// One provider call with a single immediate re-attempt on transient errors
///
/// The re-attempt is skipped when less time is left before `deadline` than
/// the failed call took.
fn attempt(
    provider: &(dyn LlmProvider<Error = LlmError> + Send + Sync),
    prompt: &str,
    deadline: Option<Instant>,
) -> Result<String, LlmError> {
    let started = Instant::now();
    match provider.generate(prompt) {
        Err(e) if e.is_transient() => {
            let now = Instant::now();
            let took = now.duration_since(started);
            if deadline.is_some_and(|d| d.saturating_duration_since(now) <= took) {
                debug!(provider = provider.name(), reason = %e, "transient failure, no time left to retry");
                return Err(e);
            }
            debug!(provider = provider.name(), reason = %e, "transient failure, retrying once");
            provider.generate(prompt)
        }
        other => other,
    }
}

impl LlmProvider for ProviderChain {
    type Error = LlmError;

    fn name(&self) -> &str {
        "chain"
    }

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.run(prompt, self.preferred.as_deref(), None)
    }

    fn generate_by(&self, prompt: &str, deadline: Instant) -> Result<String, Self::Error> {
        self.run(prompt, self.preferred.as_deref(), Some(deadline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// Blocks for `delay`, then reports a timeout
    #[derive(Clone)]
    struct HungProvider {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl HungProvider {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LlmProvider for HungProvider {
        type Error = LlmError;

        fn name(&self) -> &str {
            "hung"
        }

        fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Err(LlmError::Timeout("no response".into()))
        }
    }

    #[test]
    fn test_first_provider_wins() {
        let primary = MockProvider::new("primary").with_name("a");
        let backup = MockProvider::new("backup").with_name("b");
        let chain = ProviderChain::new()
            .with_provider(primary.clone())
            .with_provider(backup.clone());

        assert_eq!(chain.generate("p").unwrap(), "primary");
        assert_eq!(primary.call_count(), 1);
        assert_eq!(backup.call_count(), 0);
    }

    #[test]
    fn test_falls_through_on_quota_and_credentials() {
        let quota = MockProvider::failing("quota", LlmError::RateLimitExceeded);
        let creds = MockProvider::failing("creds", LlmError::Authentication("401".into()));
        let good = MockProvider::new("ok").with_name("good");
        let chain = ProviderChain::new()
            .with_provider(quota.clone())
            .with_provider(creds.clone())
            .with_provider(good);

        assert_eq!(chain.generate("p").unwrap(), "ok");
        // Non-transient failures are not retried
        assert_eq!(quota.call_count(), 1);
        assert_eq!(creds.call_count(), 1);
    }

    #[test]
    fn test_transient_failure_retried_once() {
        let flaky = MockProvider::new("recovered").with_name("flaky");
        flaky.queue_error(LlmError::Communication("connection reset".into()));
        let backup = MockProvider::new("backup").with_name("backup");
        let chain = ProviderChain::new()
            .with_provider(flaky.clone())
            .with_provider(backup.clone());

        assert_eq!(chain.generate("p").unwrap(), "recovered");
        assert_eq!(flaky.call_count(), 2);
        assert_eq!(backup.call_count(), 0);
    }

    #[test]
    fn test_transient_failure_retried_only_once() {
        let down = MockProvider::failing("down", LlmError::Timeout("60s".into()));
        let backup = MockProvider::new("backup").with_name("backup");
        let chain = ProviderChain::new()
            .with_provider(down.clone())
            .with_provider(backup);

        assert_eq!(chain.generate("p").unwrap(), "backup");
        assert_eq!(down.call_count(), 2);
    }

    #[test]
    fn test_all_providers_exhausted() {
        let chain = ProviderChain::new()
            .with_provider(MockProvider::failing("a", LlmError::RateLimitExceeded))
            .with_provider(MockProvider::failing("b", LlmError::ModelNotAvailable("m".into())));

        match chain.generate("p") {
            Err(LlmError::AllProvidersExhausted { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].provider, "a");
                assert_eq!(attempts[1].provider, "b");
                assert!(attempts[1].reason.contains("Model not available"));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_chain_is_exhausted() {
        let chain = ProviderChain::new();
        assert!(chain.is_empty());
        assert!(matches!(
            chain.generate("p"),
            Err(LlmError::AllProvidersExhausted { attempts }) if attempts.is_empty()
        ));
    }

    #[test]
    fn test_preference_moves_provider_first() {
        let a = MockProvider::new("from a").with_name("a");
        let b = MockProvider::new("from b").with_name("b");
        let c = MockProvider::new("from c").with_name("c");
        let chain = ProviderChain::new()
            .with_provider(a.clone())
            .with_provider(b)
            .with_provider(c);

        assert_eq!(chain.generate_with_preference("p", Some("c")).unwrap(), "from c");
        assert_eq!(a.call_count(), 0);
        assert_eq!(chain.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stored_preference_applies_to_generate() {
        let a = MockProvider::new("from a").with_name("a");
        let b = MockProvider::new("from b").with_name("b");
        let chain = ProviderChain::new()
            .with_provider(a.clone())
            .with_provider(b)
            .prefer("b");

        assert_eq!(chain.generate("p").unwrap(), "from b");
        assert_eq!(a.call_count(), 0);
    }

    #[test]
    fn test_unknown_preference_uses_default_order() {
        let chain = ProviderChain::new()
            .with_provider(MockProvider::new("from a").with_name("a"))
            .with_provider(MockProvider::new("from b").with_name("b"));

        assert_eq!(chain.generate_with_preference("p", Some("zzz")).unwrap(), "from a");
    }

    #[test]
    fn test_preferred_failure_falls_back_in_order() {
        let chain = ProviderChain::new()
            .with_provider(MockProvider::new("from a").with_name("a"))
            .with_provider(MockProvider::failing("b", LlmError::RateLimitExceeded));

        assert_eq!(chain.generate_with_preference("p", Some("b")).unwrap(), "from a");
    }

    #[test]
    fn test_timeout_not_retried_when_budget_is_short() {
        let hung = HungProvider::new(Duration::from_millis(150));
        let backup = MockProvider::new("backup").with_name("backup");
        let chain = ProviderChain::new()
            .with_provider(hung.clone())
            .with_provider(backup.clone());

        let deadline = Instant::now() + Duration::from_millis(250);
        assert_eq!(chain.generate_by("p", deadline).unwrap(), "backup");
        assert_eq!(hung.calls(), 1);
        assert_eq!(backup.call_count(), 1);
    }

    #[test]
    fn test_timeout_retried_when_budget_allows() {
        let hung = HungProvider::new(Duration::from_millis(20));
        let backup = MockProvider::new("backup").with_name("backup");
        let chain = ProviderChain::new()
            .with_provider(hung.clone())
            .with_provider(backup);

        let deadline = Instant::now() + Duration::from_secs(5);
        assert_eq!(chain.generate_by("p", deadline).unwrap(), "backup");
        assert_eq!(hung.calls(), 2);
    }

    #[test]
    fn test_passed_deadline_skips_every_provider() {
        let a = MockProvider::new("from a").with_name("a");
        let b = MockProvider::new("from b").with_name("b");
        let chain = ProviderChain::new()
            .with_provider(a.clone())
            .with_provider(b.clone());

        match chain.generate_by("p", Instant::now()) {
            Err(LlmError::AllProvidersExhausted { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts.iter().all(|f| f.reason == "time budget spent"));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(a.call_count(), 0);
        assert_eq!(b.call_count(), 0);
    }
}
