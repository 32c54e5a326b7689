//! steadyrpc-http — HTTP JSON-RPC transport and the high-level client.
//!
//! [`HttpTransport`] performs the actual network call and owns failure
//! classification at the wire boundary. [`RpcClient`] is what applications
//! hold: it routes every call through the retry engine and serializes
//! transaction submission through the operation queue.

pub mod client;
pub mod transport;

pub use client::{RpcClient, RpcClientConfig};
pub use transport::{HttpTransport, HttpTransportConfig};
