//! The retry engine: runs one logical operation to completion, fatal
//! failure, or exhaustion.
//!
//! Each attempt re-evaluates the circuit breaker and endpoint choice, so a
//! breaker that opens mid-retry reroutes the very next attempt to the
//! fallback. Only rate-limit failures feed the breaker; transient network
//! errors are retried without counting, and fatal errors terminate
//! immediately without sleeping.

use std::future::Future;
use std::time::Duration;

use crate::error::{Resolved, RpcError};
use crate::events::{emit, ProgressEvent, ProgressSink};
use crate::policy::{BackoffConfig, CircuitBreaker, CircuitBreakerConfig, Endpoint, EndpointSet};

/// Immutable per-call retry configuration.
///
/// The defaults are tuned for free-tier providers: a worst case of a dozen
/// attempts spaced by multi-minute backoff is intentional given how long
/// a 429 window lasts, not an oversight.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, counting the first try.
    pub max_attempts: u32,
    /// Exponential backoff applied between attempts.
    pub backoff: BackoffConfig,
    /// Fixed courtesy delay before every attempt, independent of backoff.
    pub pre_attempt_delay: Duration,
    /// Whether the courtesy delay also precedes the first attempt.
    pub pre_delay_first_attempt: bool,
    /// Attempt index at which endpoint selection switches to the fallback.
    pub failover_after_attempt: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            backoff: BackoffConfig::default(),
            pre_attempt_delay: Duration::from_secs(3),
            pre_delay_first_attempt: true,
            failover_after_attempt: 3,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps and never retries. Useful for probes.
    pub fn immediate() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffConfig {
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
                jitter_max: Duration::ZERO,
            },
            pre_attempt_delay: Duration::ZERO,
            pre_delay_first_attempt: false,
            failover_after_attempt: u32::MAX,
        }
    }
}

/// Executes operations against one logical target with failover, backoff and
/// circuit breaking.
///
/// Construct one per target at startup and share it (`Clone` shares the
/// breaker). There are no process-wide singletons; tests build isolated
/// engines freely.
#[derive(Clone)]
pub struct RetryEngine {
    endpoints: EndpointSet,
    breaker: CircuitBreaker,
}

impl RetryEngine {
    pub fn new(endpoints: EndpointSet, breaker_config: CircuitBreakerConfig) -> Self {
        Self {
            endpoints,
            breaker: CircuitBreaker::new(breaker_config),
        }
    }

    /// The breaker guarding this target.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// The endpoints this engine rotates through.
    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// Fast health probe for callers that want to fail before queueing.
    pub fn is_healthy(&self) -> bool {
        !self.breaker.is_open()
    }

    /// Run `op` to completion under `policy`.
    ///
    /// `op` receives the endpoint chosen for the current attempt and returns
    /// an already-classified result (the transport owns classification; see
    /// [`crate::classify`]). Progress lands on `progress` if supplied.
    ///
    /// With the breaker open and no fallback endpoint configured, fails fast
    /// with [`RpcError::CircuitOpen`] before any network attempt.
    pub async fn execute<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        progress: Option<&ProgressSink>,
        op: F,
    ) -> Result<T, RpcError>
    where
        F: Fn(Endpoint) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        if self.breaker.is_open() && !self.endpoints.has_fallback() {
            let retry_after = self.breaker.retry_after();
            emit(progress, ProgressEvent::Failed {
                message: format!("circuit open, retry in ~{}s", retry_after.as_secs()),
            });
            return Err(RpcError::CircuitOpen { retry_after });
        }

        let mut attempt = 0u32;
        loop {
            if (attempt > 0 || policy.pre_delay_first_attempt)
                && !policy.pre_attempt_delay.is_zero()
            {
                tokio::time::sleep(policy.pre_attempt_delay).await;
            }

            let endpoint = self
                .endpoints
                .select(self.breaker.is_open(), attempt, policy.failover_after_attempt)
                .clone();
            emit(progress, ProgressEvent::Attempting {
                attempt,
                max_attempts: policy.max_attempts,
                endpoint: endpoint.url.clone(),
            });

            let err = match op(endpoint).await {
                Ok(value) => {
                    self.breaker.record_success();
                    emit(progress, ProgressEvent::Completed);
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                emit(progress, ProgressEvent::Failed { message: err.to_string() });
                return Err(err);
            }
            if err.counts_against_breaker() {
                self.breaker.record_failure();
            }

            attempt += 1;
            if attempt >= policy.max_attempts {
                tracing::error!(attempts = attempt, error = %err, "retry budget exhausted");
                emit(progress, ProgressEvent::Failed { message: err.to_string() });
                return Err(RpcError::Fatal {
                    code: err.code(),
                    message: format!("retry budget exhausted after {attempt} attempts: {err}"),
                });
            }

            let delay = policy.backoff.delay(attempt);
            tracing::warn!(
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis(),
                error = %err,
                "retrying operation"
            );
            emit(progress, ProgressEvent::Backoff {
                attempt: attempt - 1,
                max_attempts: policy.max_attempts,
                delay,
            });
            tokio::time::sleep(delay).await;
        }
    }

    /// Like [`execute`](Self::execute), but terminal failures resolve to a
    /// caller-supplied degraded value instead of an error. The caller can
    /// still tell the two apart through [`Resolved`].
    pub async fn execute_or<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        progress: Option<&ProgressSink>,
        fallback: T,
        op: F,
    ) -> Resolved<T>
    where
        F: Fn(Endpoint) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        match self.execute(policy, progress, op).await {
            Ok(value) => Resolved::Fresh(value),
            Err(err) => Resolved::Fallback { value: fallback, error: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Endpoint, EndpointRole};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn engine() -> RetryEngine {
        RetryEngine::new(
            EndpointSet::new(
                Endpoint::primary("https://primary.example"),
                vec![Endpoint::fallback("https://fallback.example")],
            ),
            CircuitBreakerConfig { failure_threshold: 3, reset_timeout: Duration::from_secs(600) },
        )
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: BackoffConfig {
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(100),
                jitter_max: Duration::ZERO,
            },
            pre_attempt_delay: Duration::ZERO,
            pre_delay_first_attempt: false,
            failover_after_attempt: 3,
        }
    }

    fn rate_limited() -> RpcError {
        RpcError::RateLimited { code: 429, message: "Too many requests".into() }
    }

    #[tokio::test]
    async fn success_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result = engine()
            .execute(&quick_policy(12), None, |_ep| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, RpcError>(7u64) }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_terminates_without_sleep_or_breaker() {
        let eng = engine();
        let started = Instant::now();
        let calls = AtomicU32::new(0);
        let result: Result<u64, _> = eng
            .execute(&quick_policy(12), None, |_ep| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RpcError::Fatal { code: 0, message: "Invalid public key".into() }) }
            })
            .await;
        assert!(matches!(result, Err(RpcError::Fatal { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(eng.breaker().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_budget_exhausted() {
        let eng = engine();
        let calls = AtomicU32::new(0);
        let result: Result<u64, _> = eng
            .execute(&quick_policy(4), None, |_ep| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(RpcError::Fatal { code, message }) => {
                assert_eq!(code, 429);
                assert!(message.contains("exhausted after 4 attempts"), "{message}");
            }
            other => panic!("expected Fatal, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_retries_without_breaker_bookkeeping() {
        let eng = engine();
        let calls = AtomicU32::new(0);
        let result = eng
            .execute(&quick_policy(12), None, |_ep| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(RpcError::Transient("connection reset".into()))
                    } else {
                        Ok(1u8)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(eng.breaker().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn successes_between_rate_limits_keep_breaker_closed() {
        let eng = engine();
        // Three calls, each throttled exactly once before succeeding. The
        // threshold is 3, but the streak never exceeds one because every
        // success resets the count.
        for _ in 0..3 {
            let calls = AtomicU32::new(0);
            let result = eng
                .execute(&quick_policy(12), None, |_ep| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n == 0 {
                            Err(rate_limited())
                        } else {
                            Ok(3u8)
                        }
                    }
                })
                .await;
            assert_eq!(result.unwrap(), 3);
        }
        assert!(!eng.breaker().is_open());
        assert_eq!(eng.breaker().consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_opens_then_routes_to_fallback() {
        let eng = engine();
        let seen = StdMutex::new(Vec::new());
        let calls = AtomicU32::new(0);
        // failover_after is out of reach, so any fallback routing below is
        // driven purely by the breaker opening.
        let policy = RetryPolicy { failover_after_attempt: 10, ..quick_policy(5) };
        let result: Result<u8, _> = eng
            .execute(&policy, None, |ep| {
                seen.lock().unwrap().push(ep.role);
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(rate_limited())
                    } else {
                        Ok(9u8)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 9);
        let seen = seen.into_inner().unwrap();
        // Three classified 429s open the breaker (threshold 3); the fourth
        // attempt must reroute to the fallback.
        assert_eq!(
            seen,
            vec![
                EndpointRole::Primary,
                EndpointRole::Primary,
                EndpointRole::Primary,
                EndpointRole::Fallback,
            ]
        );
        assert!(eng.breaker().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_without_fallback_fails_fast() {
        let eng = RetryEngine::new(
            EndpointSet::single("https://only.example"),
            CircuitBreakerConfig { failure_threshold: 1, reset_timeout: Duration::from_secs(600) },
        );
        eng.breaker().record_failure();
        assert!(!eng.is_healthy());

        let calls = AtomicU32::new(0);
        let result: Result<u8, _> = eng
            .execute(&quick_policy(12), None, |_ep| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(1u8) }
            })
            .await;
        match result {
            Err(RpcError::CircuitOpen { retry_after }) => {
                assert!(retry_after > Duration::from_secs(590));
            }
            other => panic!("expected CircuitOpen, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0, "no network attempt while open");
    }

    #[tokio::test(start_paused = true)]
    async fn pre_attempt_delay_applies_to_first_attempt() {
        let eng = engine();
        let policy = RetryPolicy {
            pre_attempt_delay: Duration::from_secs(3),
            pre_delay_first_attempt: true,
            ..quick_policy(2)
        };
        let started = Instant::now();
        let _ = eng
            .execute(&policy, None, |_ep| async { Ok::<_, RpcError>(()) })
            .await;
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_events_cover_every_retry() {
        let eng = engine();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let calls = AtomicU32::new(0);
        let _ = eng
            .execute(&quick_policy(3), Some(&tx), |_ep| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(rate_limited())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        assert!(matches!(events[0], ProgressEvent::Attempting { attempt: 0, .. }));
        assert!(matches!(events[1], ProgressEvent::Backoff { attempt: 0, .. }));
        assert!(matches!(events[2], ProgressEvent::Attempting { attempt: 1, .. }));
        assert_eq!(*events.last().unwrap(), ProgressEvent::Completed);
    }

    #[tokio::test]
    async fn execute_or_marks_degraded_results() {
        let eng = engine();
        let degraded = eng
            .execute_or(&quick_policy(1), None, 0u64, |_ep| async {
                Err(RpcError::Fatal { code: 0, message: "Invalid public key".into() })
            })
            .await;
        assert!(!degraded.is_fresh());
        assert_eq!(degraded.value(), 0);

        let fresh = eng
            .execute_or(&quick_policy(1), None, 0u64, |_ep| async { Ok(55u64) })
            .await;
        assert!(fresh.is_fresh());
        assert_eq!(fresh.value(), 55);
    }
}
