//! Reliability policies composed by the retry engine.
//!
//! Evaluation order for each attempt:
//! ```text
//! pre-attempt delay → [CircuitBreaker] → [EndpointSet] → attempt → [BackoffConfig]
//! ```

pub mod backoff;
pub mod circuit_breaker;
pub mod endpoints;

pub use backoff::BackoffConfig;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use endpoints::{Endpoint, EndpointRole, EndpointSet};
