//! Failure classification at the transport boundary.
//!
//! Free-tier providers wrap a structured `{"error":{"code":..,"message":..}}`
//! object inside a free-text error string more often than they return clean
//! JSON-RPC errors. This module is the single place that untangles that:
//! it scans the raw message for a brace-delimited fragment, parses it
//! best-effort, and produces a [`Classified`] verdict the retry engine and
//! circuit breaker can act on. Parsing never leaks past this file.

use serde_json::Value;

use crate::error::RpcError;

/// Message fragments that mark a rate-limit rejection regardless of code.
const RATE_LIMIT_MARKERS: &[&str] = &["429", "rate-limited", "Too many requests"];

/// A structured verdict extracted from an arbitrary remote failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub code: i64,
    pub message: String,
    pub is_rate_limit: bool,
}

/// Classify a raw failure from a remote call.
///
/// `raw_code` is the failure's own code field, if it carried one. The message
/// is scanned for an embedded JSON error object first; the explicit fields are
/// the fallback, and `{0, "Unknown error"}` the last resort. Never panics and
/// never fails: any parse problem degrades to the fallback form.
pub fn classify(raw_code: Option<i64>, raw_message: &str) -> Classified {
    let (code, message) = match extract_embedded_error(raw_message) {
        Some((code, message)) => (code, message),
        None => {
            let message = if raw_message.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                raw_message.to_string()
            };
            (raw_code.unwrap_or(0), message)
        }
    };

    let is_rate_limit = code == 429
        || RATE_LIMIT_MARKERS.iter().any(|m| raw_message.contains(m));

    Classified { code, message, is_rate_limit }
}

/// Turn a verdict into the error taxonomy the retry engine consumes.
pub fn to_rpc_error(verdict: Classified) -> RpcError {
    if verdict.is_rate_limit {
        RpcError::RateLimited { code: verdict.code, message: verdict.message }
    } else {
        RpcError::Fatal { code: verdict.code, message: verdict.message }
    }
}

/// Classify a raw failure message straight into an [`RpcError`].
pub fn classify_failure(raw_code: Option<i64>, raw_message: &str) -> RpcError {
    to_rpc_error(classify(raw_code, raw_message))
}

/// Best-effort scan for a brace-delimited JSON fragment carrying
/// `error.code` / `error.message` (or top-level `code` / `message`).
fn extract_embedded_error(message: &str) -> Option<(i64, String)> {
    let start = message.find('{')?;
    let end = message.rfind('}')?;
    if end <= start {
        return None;
    }
    let fragment: Value = serde_json::from_str(&message[start..=end]).ok()?;
    let obj = fragment.get("error").unwrap_or(&fragment);
    let code = obj.get("code")?.as_i64()?;
    let msg = obj.get("message")?.as_str()?;
    Some((code, msg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_embedded_error_object() {
        let raw = r#"failed to fetch: {"error":{"code":429,"message":"Too many requests"}} (status 429)"#;
        let v = classify(None, raw);
        assert_eq!(v.code, 429);
        assert_eq!(v.message, "Too many requests");
        assert!(v.is_rate_limit);
    }

    #[test]
    fn extracts_top_level_code_message() {
        let raw = r#"node said {"code":-32602,"message":"Invalid params"}"#;
        let v = classify(None, raw);
        assert_eq!(v.code, -32602);
        assert_eq!(v.message, "Invalid params");
        assert!(!v.is_rate_limit);
    }

    #[test]
    fn falls_back_to_explicit_fields() {
        let v = classify(Some(-32000), "Transaction simulation failed");
        assert_eq!(v.code, -32000);
        assert_eq!(v.message, "Transaction simulation failed");
        assert!(!v.is_rate_limit);
    }

    #[test]
    fn unknown_error_last_resort() {
        let v = classify(None, "");
        assert_eq!(v.code, 0);
        assert_eq!(v.message, "Unknown error");
        assert!(!v.is_rate_limit);
    }

    #[test]
    fn marker_strings_flag_rate_limit() {
        for raw in ["HTTP 429 from provider", "you are being rate-limited", "Too many requests, slow down"] {
            assert!(classify(None, raw).is_rate_limit, "marker missed in: {raw}");
        }
    }

    #[test]
    fn malformed_fragment_degrades_gracefully() {
        let raw = "garbage {not json at all} trailing";
        let v = classify(Some(7), raw);
        assert_eq!(v.code, 7);
        assert_eq!(v.message, raw);
    }

    #[test]
    fn code_429_flags_rate_limit_without_markers() {
        let v = classify(Some(429), "slow down please");
        assert!(v.is_rate_limit);
    }

    #[test]
    fn verdict_maps_to_taxonomy() {
        let rl = classify_failure(Some(429), "Too many requests");
        assert!(matches!(rl, RpcError::RateLimited { code: 429, .. }));

        let fatal = classify_failure(Some(0), "Invalid public key");
        assert!(matches!(fatal, RpcError::Fatal { code: 0, .. }));
    }
}
