//! Bounded retry with exponential backoff for generation calls.

use super::TextGenerator;
use crate::config::LlmSettings;
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// How often and how patiently to retry transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&LlmSettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            max_delay: Duration::from_millis(settings.retry_max_delay_ms),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base doubled per retry, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Wraps another generator and retries transient failures.
pub struct RetryingGenerator {
    inner: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

/// Run `op` until it succeeds, fails permanently, or the retries run out.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && retries < policy.max_retries => {
                retries += 1;
                let delay = policy.delay_for(retries);
                warn!(
                    error = %e,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Generation failed, retrying..."
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    error!(error = %e, "Generation failed after all retries");
                }
                return Err(e);
            }
        }
    }
}

#[async_trait]
impl TextGenerator for RetryingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let inner = &self.inner;
        with_retry(&self.policy, || inner.generate(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationFailure, NewsdeskError};
    use crate::llm::testing::ScriptedGenerator;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8_000),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(6), Duration::from_millis(8_000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(8_000));
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failure() {
        let inner = Arc::new(ScriptedGenerator::from_results(vec![
            Err(NewsdeskError::generation(GenerationFailure::RateLimited, "429")),
            Err(NewsdeskError::generation(GenerationFailure::Timeout, "slow")),
            Ok("요약".to_string()),
        ]));
        let retrying = RetryingGenerator::new(inner.clone(), fast_policy(3));

        let text = retrying.generate("prompt").await.unwrap();
        assert_eq!(text, "요약");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = Arc::new(ScriptedGenerator::failing(GenerationFailure::Transport));
        let retrying = RetryingGenerator::new(inner.clone(), fast_policy(2));

        let err = retrying.generate("prompt").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_rejected_is_not_retried() {
        let inner = Arc::new(ScriptedGenerator::failing(GenerationFailure::Rejected));
        let retrying = RetryingGenerator::new(inner.clone(), fast_policy(3));

        tokio_test::assert_err!(retrying.generate("prompt").await);
        assert_eq!(inner.calls(), 1);
    }
}
