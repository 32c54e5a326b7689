//! Exponential backoff with a ceiling and bounded jitter.

use std::time::Duration;

/// Backoff schedule configuration.
///
/// The invariant worth preserving is the shape, not the constants:
/// exponential growth capped by a ceiling, plus bounded uniform jitter so a
/// burst of throttled clients does not retry in lockstep. The defaults mirror
/// what a free-tier Solana endpoint tolerates.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Base of the exponential curve: attempt `a` waits `base * 2^a`
    /// (capped), so the first retry waits twice this.
    pub base_delay: Duration,
    /// Ceiling on the exponential curve.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to every retry delay.
    pub jitter_max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(8),
            max_delay: Duration::from_secs(300),
            jitter_max: Duration::from_secs(5),
        }
    }
}

impl BackoffConfig {
    /// Delay before attempt `attempt` (0-based). Zero for the first try.
    ///
    /// `delay(a) = min(base * 2^a, max) + uniform(0, jitter_max)` for a >= 1.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = self
            .base_delay
            .checked_mul(1u32 << attempt.min(20))
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        exp + self.jitter(attempt)
    }

    fn jitter(&self, _attempt: u32) -> Duration {
        let max_ms = self.jitter_max.as_millis() as u64;
        if max_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(0..=max_ms))
        }
    }
}
