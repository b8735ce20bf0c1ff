//! Retry/backoff controller
//!
//! Wraps a single upstream call, branches exhaustively on the tagged
//! failure kind, and applies a bounded retry policy with progressive
//! linear backoff. Never propagates an error past its boundary: every
//! classified failure becomes a user-displayable message, because a
//! conversational assistant must always produce some reply.
//!
//! Backoff sleeps suspend only this request's logical flow; concurrent
//! requests proceed independently.

use std::future::Future;
use std::time::Duration;

use sahayak_config::RetryConfig;
use sahayak_core::{RetrievalGenerator, UpstreamError};

use crate::messages;

/// Query substituted when a comprehensive request exceeds the upstream
/// payload budget
const SIMPLIFIED_QUERY: &str = "list main government schemes";

/// What the controller hands back to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// Upstream produced a real answer; eligible for caching
    Answer(String),
    /// Answer produced by the simplified degraded request; shown to the
    /// user but never cached
    Degraded(String),
    /// Soft failure; the fixed message to display, never cached
    Failed(String),
}

/// Bounded retry with progressive linear backoff
pub struct RetryController {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryController {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Run `attempt` under the retry policy.
    ///
    /// - Rate limited: sleep `(attempt_index + 1) * base_delay` and retry;
    ///   exhaustion returns the fixed "please wait" message.
    /// - Payload too large: for comprehensive queries only, one simplified
    ///   request is tried outside the loop; otherwise (or if that also
    ///   fails) the fixed "be more specific" message.
    /// - Any other failure: fail fast with the detail embedded.
    pub async fn run<F, Fut>(
        &self,
        backend: &dyn RetrievalGenerator,
        comprehensive: bool,
        mut attempt: F,
    ) -> RetryOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, UpstreamError>>,
    {
        for attempt_index in 0..self.max_retries {
            match attempt().await {
                Ok(text) => return RetryOutcome::Answer(text),
                Err(UpstreamError::RateLimited) => {
                    let is_final = attempt_index + 1 >= self.max_retries;
                    if is_final {
                        tracing::warn!(
                            attempts = self.max_retries,
                            "rate limit persisted through all retries"
                        );
                        return RetryOutcome::Failed(messages::RATE_LIMITED.to_string());
                    }
                    let delay = self.base_delay * (attempt_index + 1);
                    tracing::debug!(
                        attempt = attempt_index + 1,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(UpstreamError::PayloadTooLarge) => {
                    // One degraded attempt, first failure only, outside
                    // the retry loop.
                    if comprehensive {
                        tracing::info!("request too large, trying simplified query once");
                        if let Ok(text) = backend.invoke(SIMPLIFIED_QUERY).await {
                            if !text.trim().is_empty() {
                                return RetryOutcome::Degraded(format!(
                                    "{}{}",
                                    messages::SIMPLIFIED_PREFIX,
                                    text
                                ));
                            }
                        }
                    }
                    return RetryOutcome::Failed(messages::QUERY_TOO_LARGE.to_string());
                }
                Err(UpstreamError::Other(detail)) => {
                    tracing::warn!(%detail, "non-retryable upstream failure");
                    return RetryOutcome::Failed(format!("Error processing query: {}", detail));
                }
            }
        }

        // Unreachable: the final rate-limited attempt returns inside the
        // loop, and every other arm returns immediately.
        RetryOutcome::Failed(messages::RATE_LIMITED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: pops one result per call, counts invocations
    struct ScriptedBackend {
        script: parking_lot::Mutex<Vec<Result<String, UpstreamError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, UpstreamError>>) -> Self {
            Self {
                script: parking_lot::Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RetrievalGenerator for ScriptedBackend {
        async fn invoke(&self, _query: &str) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock();
            if script.is_empty() {
                Ok("fallback answer".to_string())
            } else {
                script.remove(0)
            }
        }
    }

    fn fast_controller() -> RetryController {
        RetryController::new(&RetryConfig {
            max_retries: 3,
            base_delay_ms: 0,
        })
    }

    #[tokio::test]
    async fn success_short_circuits() {
        let backend = ScriptedBackend::new(vec![Ok("answer".to_string())]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, false, || backend.invoke("q"))
            .await;
        assert_eq!(outcome, RetryOutcome::Answer("answer".to_string()));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn rate_limit_retries_then_succeeds() {
        let backend = ScriptedBackend::new(vec![
            Err(UpstreamError::RateLimited),
            Err(UpstreamError::RateLimited),
            Ok("eventually".to_string()),
        ]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, false, || backend.invoke("q"))
            .await;
        assert_eq!(outcome, RetryOutcome::Answer("eventually".to_string()));
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn rate_limit_exhaustion_returns_wait_message() {
        let backend = ScriptedBackend::new(vec![
            Err(UpstreamError::RateLimited),
            Err(UpstreamError::RateLimited),
            Err(UpstreamError::RateLimited),
        ]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, false, || backend.invoke("q"))
            .await;
        assert_eq!(
            outcome,
            RetryOutcome::Failed(messages::RATE_LIMITED.to_string())
        );
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn payload_too_large_degrades_comprehensive_query() {
        let backend = ScriptedBackend::new(vec![
            Err(UpstreamError::PayloadTooLarge),
            Ok("short scheme list".to_string()),
        ]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, true, || backend.invoke("list everything"))
            .await;
        match outcome {
            RetryOutcome::Degraded(text) => {
                assert!(text.starts_with(messages::SIMPLIFIED_PREFIX));
                assert!(text.contains("short scheme list"));
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn payload_too_large_on_plain_query_fails_fast() {
        let backend = ScriptedBackend::new(vec![Err(UpstreamError::PayloadTooLarge)]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, false, || backend.invoke("q"))
            .await;
        assert_eq!(
            outcome,
            RetryOutcome::Failed(messages::QUERY_TOO_LARGE.to_string())
        );
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn simplified_retry_failure_falls_back_to_message() {
        let backend = ScriptedBackend::new(vec![
            Err(UpstreamError::PayloadTooLarge),
            Err(UpstreamError::PayloadTooLarge),
        ]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, true, || backend.invoke("list everything"))
            .await;
        assert_eq!(
            outcome,
            RetryOutcome::Failed(messages::QUERY_TOO_LARGE.to_string())
        );
    }

    #[tokio::test]
    async fn other_failure_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(UpstreamError::Other("parse error".into()))]);
        let controller = fast_controller();
        let outcome = controller
            .run(&backend, false, || backend.invoke("q"))
            .await;
        match outcome {
            RetryOutcome::Failed(text) => assert!(text.contains("parse error")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(backend.call_count(), 1);
    }
}
