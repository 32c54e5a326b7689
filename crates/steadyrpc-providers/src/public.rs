//! Public Solana cluster endpoints.
//!
//! Free, no-API-key endpoints. They rate-limit aggressively, so these
//! profiles carry the patient free-tier schedule and no fallback (there is
//! nothing better to fail over to).

use steadyrpc_core::policy::EndpointSet;
use steadyrpc_core::RpcError;
use steadyrpc_http::{RpcClient, RpcClientConfig};

use crate::free_tier_config;

pub const MAINNET_BETA_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEVNET_URL: &str = "https://api.devnet.solana.com";
pub const TESTNET_URL: &str = "https://api.testnet.solana.com";

/// Config for the public mainnet-beta cluster.
pub fn mainnet_beta_config() -> RpcClientConfig {
    free_tier_config(EndpointSet::single(MAINNET_BETA_URL))
}

/// Client for the public mainnet-beta cluster.
pub fn mainnet_beta() -> Result<RpcClient, RpcError> {
    RpcClient::new(mainnet_beta_config())
}

/// Config for the public devnet cluster.
pub fn devnet_config() -> RpcClientConfig {
    free_tier_config(EndpointSet::single(DEVNET_URL))
}

/// Client for the public devnet cluster.
pub fn devnet() -> Result<RpcClient, RpcError> {
    RpcClient::new(devnet_config())
}

/// Config for the public testnet cluster.
pub fn testnet_config() -> RpcClientConfig {
    free_tier_config(EndpointSet::single(TESTNET_URL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_configs_have_no_fallback() {
        assert!(!mainnet_beta_config().endpoints.has_fallback());
        assert!(!devnet_config().endpoints.has_fallback());
    }

    #[test]
    fn public_configs_use_patient_schedule() {
        let config = mainnet_beta_config();
        assert_eq!(config.retry.max_attempts, 12);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
    }
}
