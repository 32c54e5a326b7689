//! HTTP JSON-RPC transport backed by `reqwest`.
//!
//! This is the boundary where raw wire failures become classified
//! [`RpcError`]s: HTTP 429 and marker-bearing bodies become `RateLimited`,
//! connection/timeout problems become `Transient`, and node-side JSON-RPC
//! error objects are routed through the classifier. Nothing above this layer
//! parses provider error strings.

use std::time::Duration;

use async_trait::async_trait;

use steadyrpc_core::classify::classify_failure;
use steadyrpc_core::policy::Endpoint;
use steadyrpc_core::request::{JsonRpcRequest, JsonRpcResponse};
use steadyrpc_core::transport::RpcTransport;
use steadyrpc_core::RpcError;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Timeout per individual HTTP request, independent of the retry and
    /// cooldown timers — a hung connection must not stall the state machine.
    pub request_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Sends JSON-RPC requests over HTTP POST.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RpcError::Fatal {
                code: 0,
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }

    fn map_reqwest_error(e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Transient(format!("request timed out: {e}"))
        } else if e.status().map(|s| s.as_u16()) == Some(429) {
            RpcError::RateLimited { code: 429, message: e.to_string() }
        } else {
            RpcError::Transient(e.to_string())
        }
    }
}

/// Map a non-2xx HTTP status and its body to a classified error.
fn classify_http_failure(status: reqwest::StatusCode, body: &str) -> RpcError {
    if status.as_u16() == 429 {
        return RpcError::RateLimited {
            code: 429,
            message: if body.is_empty() { "Too many requests".into() } else { body.to_string() },
        };
    }
    if status.is_server_error() {
        return RpcError::Transient(format!("HTTP {status}: {body}"));
    }
    // Some providers bury a structured error object in the body.
    classify_failure(Some(i64::from(status.as_u16())), &format!("HTTP {status}: {body}"))
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        req: JsonRpcRequest,
    ) -> Result<JsonRpcResponse, RpcError> {
        let resp = self
            .http
            .post(&endpoint.url)
            .json(&req)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }

        let response: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| RpcError::Transient(format!("malformed response body: {e}")))?;

        if let Some(err) = &response.error {
            tracing::debug!(
                code = err.code,
                message = %err.message,
                endpoint = %endpoint.url,
                "node returned JSON-RPC error"
            );
        }
        Ok(response)
    }
}
