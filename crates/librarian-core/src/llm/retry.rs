//! Timeout and bounded exponential backoff for generation calls.
//!
//! `RetryPolicy` is plain configuration; `retry_with_backoff` is the generic
//! loop; `RetryingProvider` applies both to any `LlmProvider`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use librarian_types::config::RetryConfig;
use librarian_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::{LlmProvider, ProviderStream};

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: config.multiplier,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * multiplier^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// the retry budget is spent. The last error is returned on exhaustion.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    is_transient: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if retry < policy.max_retries && is_transient(&e) => {
                retry += 1;
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    operation = label,
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Wraps a provider with a per-attempt timeout and backoff on transient errors.
///
/// Streams are not retried, since fragments may already have reached the
/// client. Each fragment must arrive within the timeout instead; a stalled
/// stream ends with `LlmError::Timeout`.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<P: LlmProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            inner,
            policy,
            timeout,
        }
    }
}

impl<P: LlmProvider> LlmProvider for RetryingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let timeout = self.timeout;
        retry_with_backoff(&self.policy, "complete", LlmError::is_transient, || async move {
            match tokio::time::timeout(timeout, self.inner.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(timeout.as_millis() as u64)),
            }
        })
        .await
    }

    fn stream(&self, request: CompletionRequest) -> ProviderStream {
        let timeout = self.timeout;
        let mut upstream = self.inner.stream(request);
        Box::pin(async_stream::stream! {
            loop {
                match tokio::time::timeout(timeout, upstream.next()).await {
                    Ok(Some(event)) => yield event,
                    Ok(None) => break,
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = timeout.as_millis() as u64,
                            "generation stream stalled"
                        );
                        yield Err(LlmError::Timeout(timeout.as_millis() as u64));
                        break;
                    }
                }
            }
        })
    }
}
