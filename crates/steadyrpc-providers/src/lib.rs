//! steadyrpc-providers — pre-tuned profiles for Solana RPC providers.
//!
//! Each profile pairs endpoint URLs with retry/breaker/queue settings that
//! match what the provider's tier actually tolerates. Free public clusters
//! get the patient schedule (long backoff, wide cooldowns); paid endpoints
//! get the fast one.
//!
//! # Quick start
//! ```rust,no_run
//! use steadyrpc_providers::public;
//!
//! let client = public::mainnet_beta().expect("client");
//! ```

use std::time::Duration;

use steadyrpc_core::policy::{BackoffConfig, CircuitBreakerConfig, EndpointSet};
use steadyrpc_core::queue::QueueConfig;
use steadyrpc_core::retry::RetryPolicy;
use steadyrpc_http::RpcClientConfig;

pub mod helius;
pub mod public;
pub mod quicknode;

/// The patient schedule for free-tier endpoints.
///
/// A dozen attempts against a multi-minute backoff ceiling means the worst
/// case runs past half an hour of wall clock. That is deliberate: free-tier
/// 429 windows last minutes, and giving up early just wastes the budget.
pub fn free_tier_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 12,
        backoff: BackoffConfig {
            base_delay: Duration::from_secs(8),
            max_delay: Duration::from_secs(300),
            jitter_max: Duration::from_secs(5),
        },
        pre_attempt_delay: Duration::from_secs(3),
        pre_delay_first_attempt: true,
        failover_after_attempt: 3,
    }
}

/// Queue pacing to go with [`free_tier_policy`].
pub fn free_tier_queue() -> QueueConfig {
    QueueConfig {
        cooldown: Duration::from_secs(8),
        failure_cooldown: Duration::from_secs(20),
    }
}

/// A faster schedule for paid/dedicated endpoints.
pub fn paid_tier_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        backoff: BackoffConfig {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_max: Duration::from_secs(1),
        },
        pre_attempt_delay: Duration::ZERO,
        pre_delay_first_attempt: false,
        failover_after_attempt: 3,
    }
}

pub(crate) fn free_tier_config(endpoints: EndpointSet) -> RpcClientConfig {
    let mut config = RpcClientConfig::new(endpoints);
    config.retry = free_tier_policy();
    config.queue = free_tier_queue();
    config.circuit_breaker = CircuitBreakerConfig {
        failure_threshold: 3,
        reset_timeout: Duration::from_secs(600),
    };
    config
}

pub(crate) fn paid_tier_config(endpoints: EndpointSet) -> RpcClientConfig {
    let mut config = RpcClientConfig::new(endpoints);
    config.retry = paid_tier_policy();
    config.queue = QueueConfig {
        cooldown: Duration::from_secs(1),
        failure_cooldown: Duration::from_secs(5),
    };
    config.circuit_breaker = CircuitBreakerConfig {
        failure_threshold: 5,
        reset_timeout: Duration::from_secs(60),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_worst_case_exceeds_thirty_minutes() {
        let p = free_tier_policy();
        let mut total = p.pre_attempt_delay * p.max_attempts;
        for attempt in 1..p.max_attempts {
            // Jitter excluded — this is the guaranteed floor.
            total += (p.backoff.base_delay * 2u32.pow(attempt.min(20))).min(p.backoff.max_delay);
        }
        assert!(total > Duration::from_secs(30 * 60), "worst case only {total:?}");
    }

    #[test]
    fn paid_tier_is_snappier_than_free() {
        assert!(paid_tier_policy().backoff.base_delay < free_tier_policy().backoff.base_delay);
        assert!(paid_tier_policy().max_attempts < free_tier_policy().max_attempts);
    }
}
