//! QuickNode provider profile.
//!
//! QuickNode hands out a full endpoint URL rather than an API key, so the
//! profile just wraps whatever URL the dashboard shows, with the public
//! cluster as fallback.

use steadyrpc_core::policy::{Endpoint, EndpointSet};
use steadyrpc_core::RpcError;
use steadyrpc_http::{RpcClient, RpcClientConfig};

use crate::{paid_tier_config, public};

/// Config for a QuickNode endpoint URL.
pub fn config(endpoint_url: impl Into<String>) -> RpcClientConfig {
    paid_tier_config(EndpointSet::new(
        Endpoint::primary(endpoint_url),
        vec![Endpoint::fallback(public::MAINNET_BETA_URL)],
    ))
}

/// Client for a QuickNode endpoint URL.
pub fn client(endpoint_url: impl Into<String>) -> Result<RpcClient, RpcError> {
    RpcClient::new(config(endpoint_url))
}
