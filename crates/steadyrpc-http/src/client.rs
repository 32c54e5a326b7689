//! The high-level client: retry engine + operation queue + HTTP transport.
//!
//! This is what the application holds. Query helpers (`get_balance`,
//! `get_minimum_balance_for_rent_exemption`, ...) run straight through the
//! retry engine; transaction submission is serialized through the
//! `"sendTransaction"` queue class so at most one submission is in flight
//! system-wide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use steadyrpc_core::classify::classify_failure;
use steadyrpc_core::events::ProgressSink;
use steadyrpc_core::policy::{CircuitBreakerConfig, EndpointSet};
use steadyrpc_core::queue::{Operation, OperationHandle, OperationQueue, QueueConfig};
use steadyrpc_core::request::JsonRpcRequest;
use steadyrpc_core::retry::{RetryEngine, RetryPolicy};
use steadyrpc_core::transport::RpcTransport;
use steadyrpc_core::{Resolved, RpcError};

use crate::transport::{HttpTransport, HttpTransportConfig};

/// Everything needed to build an [`RpcClient`].
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub endpoints: EndpointSet,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,
    pub queue: QueueConfig,
    pub transport: HttpTransportConfig,
    /// Commitment level attached to queries ("processed", "confirmed", "finalized").
    pub commitment: String,
}

impl RpcClientConfig {
    /// Defaults tuned for free-tier endpoints, pointing at `endpoints`.
    pub fn new(endpoints: EndpointSet) -> Self {
        Self {
            endpoints,
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::default(),
            queue: QueueConfig::default(),
            transport: HttpTransportConfig::default(),
            commitment: "confirmed".into(),
        }
    }
}

/// A resilient JSON-RPC client for one logical target.
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    engine: RetryEngine,
    queue: OperationQueue,
    retry: RetryPolicy,
    ids: Arc<AtomicU64>,
    commitment: String,
}

impl RpcClient {
    /// Build a client with the HTTP transport.
    pub fn new(config: RpcClientConfig) -> Result<Self, RpcError> {
        let transport = Arc::new(HttpTransport::new(config.transport.clone())?);
        Ok(Self::with_transport(transport, config))
    }

    /// Build a client over an arbitrary transport (tests inject mocks here).
    pub fn with_transport(transport: Arc<dyn RpcTransport>, config: RpcClientConfig) -> Self {
        let engine = RetryEngine::new(config.endpoints, config.circuit_breaker);
        let queue = OperationQueue::new(engine.clone(), config.queue, config.retry.clone());
        Self {
            transport,
            engine,
            queue,
            retry: config.retry,
            ids: Arc::new(AtomicU64::new(1)),
            commitment: config.commitment,
        }
    }

    /// Fast health check: `false` while the breaker is open. Callers can use
    /// this to fail fast before queueing work they know will be rejected.
    pub fn is_healthy(&self) -> bool {
        self.engine.is_healthy()
    }

    /// The retry engine (and through it the breaker) backing this client.
    pub fn engine(&self) -> &RetryEngine {
        &self.engine
    }

    /// Issue `method` through the retry engine and return the raw result
    /// value (Solana's `{context,value}` envelope already unwrapped).
    pub async fn call_value(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        self.call_value_with(method, params, &self.retry, None).await
    }

    /// [`call_value`](Self::call_value) with an explicit policy and progress sink.
    pub async fn call_value_with(
        &self,
        method: &str,
        params: Vec<Value>,
        policy: &RetryPolicy,
        progress: Option<&ProgressSink>,
    ) -> Result<Value, RpcError> {
        let transport = &self.transport;
        let ids = &self.ids;
        self.engine
            .execute(policy, progress, move |endpoint| {
                let transport = transport.clone();
                let id = ids.fetch_add(1, Ordering::Relaxed);
                let req = JsonRpcRequest::new(id, method, params.clone());
                async move {
                    let resp = transport.send(&endpoint, req).await?;
                    resp.into_value()
                        .map_err(|e| classify_failure(Some(e.code), &e.message))
                }
            })
            .await
    }

    /// Issue `method` and deserialize the result value.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let value = self.call_value(method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Fatal {
            code: 0,
            message: format!("unexpected result shape for {method}: {e}"),
        })
    }

    /// Lamport balance of `pubkey`.
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, RpcError> {
        self.call(
            "getBalance",
            vec![json!(pubkey), JsonRpcRequest::commitment(&self.commitment)],
        )
        .await
    }

    /// Balance with a degraded fallback of zero — the UI can render 0 while
    /// [`Resolved::is_fresh`] still says whether the number is real.
    pub async fn get_balance_or_zero(&self, pubkey: &str) -> Resolved<u64> {
        match self.get_balance(pubkey).await {
            Ok(lamports) => Resolved::Fresh(lamports),
            Err(err) => Resolved::Fallback { value: 0, error: err.to_string() },
        }
    }

    /// The latest blockhash string.
    pub async fn get_latest_blockhash(&self) -> Result<String, RpcError> {
        let value = self
            .call_value(
                "getLatestBlockhash",
                vec![JsonRpcRequest::commitment(&self.commitment)],
            )
            .await?;
        value
            .get("blockhash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RpcError::Fatal {
                code: 0,
                message: "getLatestBlockhash result missing blockhash".into(),
            })
    }

    /// Minimum lamports to make an account of `data_len` bytes rent-exempt.
    pub async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        self.call("getMinimumBalanceForRentExemption", vec![json!(data_len)])
            .await
    }

    /// Fee in lamports for a base64-encoded message, if the node can price it.
    pub async fn get_fee_for_message(&self, message_base64: &str) -> Result<Option<u64>, RpcError> {
        self.call(
            "getFeeForMessage",
            vec![json!(message_base64), JsonRpcRequest::commitment(&self.commitment)],
        )
        .await
    }

    /// Submit a pre-signed, base64-encoded transaction.
    ///
    /// Serialized through the `"sendTransaction"` queue class: at most one
    /// submission runs at a time, with a cooldown between completions. The
    /// handle resolves with the signature. Dropping the handle does not
    /// cancel the submission.
    pub fn send_transaction(&self, tx_base64: &str) -> OperationHandle {
        self.send_transaction_with(tx_base64, None)
    }

    /// [`send_transaction`](Self::send_transaction) with a progress sink.
    pub fn send_transaction_with(
        &self,
        tx_base64: &str,
        progress: Option<ProgressSink>,
    ) -> OperationHandle {
        let op = self.operation("sendTransaction", move |tx: String| {
            vec![json!(tx), json!({ "encoding": "base64" })]
        }, tx_base64.to_string());
        self.queue
            .submit_with("sendTransaction", op, self.retry.clone(), progress)
    }

    /// Submit an arbitrary operation to a queue class. Exposed for callers
    /// with their own serialized flows (e.g. a `"createToken"` pipeline).
    pub fn submit(&self, class: &str, op: Operation) -> OperationHandle {
        self.queue.submit(class, op)
    }

    /// Submit with explicit policy and progress sink.
    pub fn submit_with(
        &self,
        class: &str,
        op: Operation,
        policy: RetryPolicy,
        progress: Option<ProgressSink>,
    ) -> OperationHandle {
        self.queue.submit_with(class, op, policy, progress)
    }

    fn operation<P, F>(&self, method: &'static str, make_params: F, payload: P) -> Operation
    where
        P: Clone + Send + Sync + 'static,
        F: Fn(P) -> Vec<Value> + Send + Sync + 'static,
    {
        let transport = self.transport.clone();
        let ids = self.ids.clone();
        Arc::new(move |endpoint| {
            let transport = transport.clone();
            let id = ids.fetch_add(1, Ordering::Relaxed);
            let req = JsonRpcRequest::new(id, method, make_params(payload.clone()));
            Box::pin(async move {
                let resp = transport.send(&endpoint, req).await?;
                resp.into_value()
                    .map_err(|e| classify_failure(Some(e.code), &e.message))
            })
        })
    }
}
