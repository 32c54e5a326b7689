//! Helius provider profile.
//!
//! Paid Helius endpoints are fast but still meter free API keys; the profile
//! pairs the dedicated endpoint with the public cluster as fallback, so a
//! throttled key degrades to the slow path instead of failing.

use steadyrpc_core::policy::{Endpoint, EndpointSet};
use steadyrpc_core::RpcError;
use steadyrpc_http::{RpcClient, RpcClientConfig};

use crate::{free_tier_config, paid_tier_config, public};

/// HTTP JSON-RPC endpoint for an API key.
pub fn http_url(api_key: &str) -> String {
    format!("https://mainnet.helius-rpc.com/?api-key={api_key}")
}

/// Devnet endpoint for an API key.
pub fn devnet_url(api_key: &str) -> String {
    format!("https://devnet.helius-rpc.com/?api-key={api_key}")
}

fn endpoints(api_key: &str) -> EndpointSet {
    EndpointSet::new(
        Endpoint::primary(http_url(api_key)),
        vec![Endpoint::fallback(public::MAINNET_BETA_URL)],
    )
}

/// Config for a paid Helius plan.
pub fn paid_config(api_key: &str) -> RpcClientConfig {
    paid_tier_config(endpoints(api_key))
}

/// Config for a free Helius API key — paid endpoint URL, free-tier pacing.
pub fn free_config(api_key: &str) -> RpcClientConfig {
    free_tier_config(endpoints(api_key))
}

/// Client for a free Helius API key.
pub fn client(api_key: &str) -> Result<RpcClient, RpcError> {
    RpcClient::new(free_config(api_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_embeds_api_key() {
        assert_eq!(
            http_url("test-key"),
            "https://mainnet.helius-rpc.com/?api-key=test-key"
        );
    }

    #[test]
    fn falls_back_to_public_cluster() {
        let config = free_config("k");
        assert!(config.endpoints.has_fallback());
        assert!(config.endpoints.primary().url.contains("helius-rpc.com"));
    }
}
