//! The `RpcTransport` trait — the seam between the execution core and
//! whatever actually performs the remote call.

use async_trait::async_trait;

use crate::error::RpcError;
use crate::policy::Endpoint;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// One remote JSON-RPC call against a specific endpoint.
///
/// Implementations own the wire: connection handling, the per-request
/// timeout, and classification of raw failures into [`RpcError`] (through
/// [`crate::classify`]) all happen behind this trait. The retry engine and
/// queue never see an unclassified failure.
///
/// Object-safe; stored as `Arc<dyn RpcTransport>` by the client facade so
/// tests can substitute a scripted mock.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request to `endpoint` and return the response.
    async fn send(
        &self,
        endpoint: &Endpoint,
        req: JsonRpcRequest,
    ) -> Result<JsonRpcResponse, RpcError>;
}
