//! steadyrpc-core — the resilient execution layer for SteadyRPC.
//!
//! # Overview
//!
//! SteadyRPC issues JSON-RPC calls to rate-limited blockchain endpoints on
//! behalf of a higher-level application. Free-tier providers answer a large
//! share of calls with HTTP 429, so every call runs through this core:
//!
//! - [`classify`] — turns arbitrary remote failures into structured verdicts
//! - [`policy::CircuitBreaker`] — per-target health, opens after repeated
//!   rate-limit failures, heals lazily after a cooldown
//! - [`policy::BackoffConfig`] — capped exponential backoff with jitter
//! - [`policy::EndpointSet`] — primary/fallback selection per attempt
//! - [`RetryEngine`] — composes the above to run one operation to completion
//! - [`OperationQueue`] — serializes operations per class with cooldowns
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`] — wire types
//! - [`RpcTransport`] — the seam to the actual network call

pub mod classify;
pub mod error;
pub mod events;
pub mod policy;
pub mod queue;
pub mod request;
pub mod retry;
pub mod transport;

pub use classify::{classify, classify_failure, Classified};
pub use error::{Resolved, RpcError};
pub use events::{ProgressEvent, ProgressSink};
pub use policy::{
    BackoffConfig, CircuitBreaker, CircuitBreakerConfig, Endpoint, EndpointRole, EndpointSet,
};
pub use queue::{Operation, OperationHandle, OperationQueue, QueueConfig};
pub use request::{JsonRpcRequest, JsonRpcResponse, RpcId};
pub use retry::{RetryEngine, RetryPolicy};
pub use transport::RpcTransport;
