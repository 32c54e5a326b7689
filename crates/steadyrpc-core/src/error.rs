//! The error taxonomy shared by every layer of the client.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while executing an RPC operation.
///
/// The variants double as the retry engine's failure classification:
/// [`RateLimited`](Self::RateLimited) and [`Transient`](Self::Transient) are
/// retryable, everything else terminates the operation. Only rate-limit
/// failures count against the circuit breaker.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// The provider rejected the request for exceeding its rate limit.
    #[error("rate limited (code {code}): {message}")]
    RateLimited { code: i64, message: String },

    /// A one-off network problem (dropped connection, timeout). Retryable,
    /// but not evidence that the provider is throttling us.
    #[error("transient error: {0}")]
    Transient(String),

    /// Not retryable: malformed input, invalid address, node-side rejection.
    /// Also the terminal form of an exhausted retry budget.
    #[error("fatal RPC error (code {code}): {message}")]
    Fatal { code: i64, message: String },

    /// Rejected before any network attempt because the breaker is open.
    #[error("circuit open, retry in ~{}s", .retry_after.as_secs())]
    CircuitOpen { retry_after: Duration },
}

impl RpcError {
    /// Returns `true` if the retry engine may attempt this operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient(_))
    }

    /// Returns `true` if this failure counts toward opening the circuit.
    pub fn counts_against_breaker(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The resolved JSON-RPC error code, where one exists.
    pub fn code(&self) -> i64 {
        match self {
            Self::RateLimited { code, .. } | Self::Fatal { code, .. } => *code,
            Self::Transient(_) | Self::CircuitOpen { .. } => 0,
        }
    }
}

/// The outcome of an operation that supports a degraded fallback value.
///
/// Callers that render a placeholder on failure (e.g. "balance unknown,
/// display 0") still need to tell real data from the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    /// The operation succeeded; `T` is real data from the chain.
    Fresh(T),
    /// The operation failed terminally; `value` is a caller-supplied stand-in.
    Fallback { value: T, error: String },
}

impl<T> Resolved<T> {
    /// The carried value, real or degraded.
    pub fn value(self) -> T {
        match self {
            Self::Fresh(v) | Self::Fallback { value: v, .. } => v,
        }
    }

    /// Returns `true` for data actually fetched from the chain.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classes() {
        assert!(RpcError::RateLimited { code: 429, message: "slow down".into() }.is_retryable());
        assert!(RpcError::Transient("connection reset".into()).is_retryable());
        assert!(!RpcError::Fatal { code: 0, message: "Invalid public key".into() }.is_retryable());
        assert!(!RpcError::CircuitOpen { retry_after: Duration::from_secs(300) }.is_retryable());
    }

    #[test]
    fn only_rate_limits_trip_the_breaker() {
        assert!(RpcError::RateLimited { code: 429, message: String::new() }.counts_against_breaker());
        assert!(!RpcError::Transient("timeout".into()).counts_against_breaker());
        assert!(!RpcError::Fatal { code: -32602, message: String::new() }.counts_against_breaker());
    }

    #[test]
    fn resolved_distinguishes_fallback() {
        let fresh = Resolved::Fresh(42u64);
        let degraded = Resolved::Fallback { value: 0u64, error: "rate limited".into() };
        assert!(fresh.is_fresh());
        assert!(!degraded.is_fresh());
        assert_eq!(degraded.value(), 0);
    }
}
