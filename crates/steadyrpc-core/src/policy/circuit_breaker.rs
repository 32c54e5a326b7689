//! Two-state circuit breaker: Closed → Open → (after a cooldown) Closed.
//!
//! Opens once `failure_threshold` consecutive rate-limit failures accrue and
//! rejects fast while open. Recovery is lazy: every state read first checks
//! whether `reset_timeout` has elapsed since the last failure and resets if
//! so. There is no timer task — the lazy check is the source of truth, so the
//! breaker heals correctly even across a process that was suspended mid-wait.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// Configuration for the circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive rate-limit failures before opening.
    pub failure_threshold: u32,
    /// How long the circuit stays open before the lazy reset closes it.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    open: bool,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Thread-safe breaker for one logical target. Cloning shares state.
///
/// Construct one per target at process start and inject it; call sites must
/// not share a hidden global.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<BreakerInner>>,
}

impl CircuitBreaker {
    /// Create a new breaker in the closed state.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(BreakerInner {
                open: false,
                consecutive_failures: 0,
                last_failure: None,
            })),
        }
    }

    /// Returns `true` while the circuit is open, applying the lazy reset
    /// first. Idempotent: once the timeout has elapsed, every call answers
    /// `false` and leaves the failure count at zero.
    pub fn is_open(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.open {
            if let Some(last) = inner.last_failure {
                if last.elapsed() > self.config.reset_timeout {
                    inner.open = false;
                    inner.consecutive_failures = 0;
                    inner.last_failure = None;
                    tracing::info!("circuit breaker reset after cooldown");
                }
            }
        }
        inner.open
    }

    /// Record a rate-limit failure. Callers must not feed transient or fatal
    /// failures here; only throttling counts toward opening the circuit.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures += 1;
        inner.last_failure = Some(Instant::now());
        if !inner.open && inner.consecutive_failures >= self.config.failure_threshold {
            inner.open = true;
            tracing::warn!(
                failures = inner.consecutive_failures,
                reset_in_secs = self.config.reset_timeout.as_secs(),
                "circuit breaker opened"
            );
        }
    }

    /// Record a successful operation, ending any failure streak. A success
    /// while the circuit is open says nothing about the throttled target
    /// (it likely went through a fallback), so only a closed breaker clears.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open && inner.consecutive_failures > 0 {
            inner.consecutive_failures = 0;
            inner.last_failure = None;
        }
    }

    /// Force the breaker back to the closed state, clearing the failure
    /// count. The lazy reset calls this internally; it is public for
    /// operators that know a provider has recovered early.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.open = false;
        inner.consecutive_failures = 0;
        inner.last_failure = None;
    }

    /// Estimated time until the lazy reset would close an open circuit.
    /// Zero when closed or already past the timeout.
    pub fn retry_after(&self) -> Duration {
        let inner = self.inner.lock().unwrap();
        match (inner.open, inner.last_failure) {
            (true, Some(last)) => self.config.reset_timeout.saturating_sub(last.elapsed()),
            _ => Duration::ZERO,
        }
    }

    /// Current consecutive-failure count (mostly for health reporting).
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().unwrap().consecutive_failures
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("CircuitBreaker")
            .field("open", &inner.open)
            .field("consecutive_failures", &inner.consecutive_failures)
            .finish()
    }
}
