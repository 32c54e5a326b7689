//! JSON-RPC 2.0 wire types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC request ID — string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request.
///
/// Solana positional params mix plain values and config objects
/// (`["<pubkey>", {"commitment":"confirmed"}]`), so params are raw
/// [`Value`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: RpcId,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id: RpcId::Number(id),
        }
    }

    /// The standard commitment config object appended to most Solana queries.
    pub fn commitment(level: &str) -> Value {
        json!({ "commitment": level })
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Returns `true` if this is a successful response (has result, no error).
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.result.is_some()
    }

    /// Unwrap the result value or return the node's error object.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }

    /// Solana wraps most query results as `{"context":..,"value":..}`;
    /// unwrap that envelope, passing other shapes through untouched.
    pub fn into_value(self) -> Result<Value, JsonRpcError> {
        let result = self.into_result()?;
        match result {
            Value::Object(mut map) if map.contains_key("value") && map.contains_key("context") => {
                Ok(map.remove("value").unwrap_or(Value::Null))
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(
            1,
            "getBalance",
            vec![json!("4Nd1mY3..."), JsonRpcRequest::commitment("confirmed")],
        );
        let out = serde_json::to_string(&req).unwrap();
        assert!(out.contains("\"jsonrpc\":\"2.0\""));
        assert!(out.contains("\"method\":\"getBalance\""));
        assert!(out.contains("\"commitment\":\"confirmed\""));
    }

    #[test]
    fn response_unwraps_context_envelope() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":31},"value":2039280}}"#,
        )
        .unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.into_value().unwrap(), json!(2039280));
    }

    #[test]
    fn response_passes_plain_results_through() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"result":"5oS3..."}"#,
        )
        .unwrap();
        assert_eq!(resp.into_value().unwrap(), json!("5oS3..."));
    }

    #[test]
    fn response_surfaces_error_object() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid param: WrongSize"}}"#,
        )
        .unwrap();
        assert!(!resp.is_ok());
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, -32602);
    }
}
