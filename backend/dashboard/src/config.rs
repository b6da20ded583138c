//! Application configuration loaded from environment variables.

use std::time::Duration;

use alloy_primitives::Address;

use crate::errors::{DashboardError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// EVM JSON-RPC endpoint (e.g. a BSC node or a local dev chain)
    pub rpc_url: String,
    /// Chain id reported alongside submitted transactions
    pub chain_id: u64,
    /// The project factory contract
    pub factory_address: Address,
    /// The WEUSD stable token contract
    pub weusd_address: Address,
    /// Node-managed account that signs submitted transactions
    pub operator_address: Address,
    /// Port for the REST API server
    pub api_port: u16,
    /// Projects fetched per `getProjectsPaginated` page
    pub page_size: u64,
    /// How often to poll for a transaction receipt
    pub receipt_poll_interval: Duration,
    /// How long to wait for a receipt before giving up
    pub receipt_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            rpc_url: env_var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),
            chain_id: env_var("CHAIN_ID")
                .unwrap_or_else(|_| "97".to_string())
                .parse()
                .map_err(|_| DashboardError::Config("Invalid CHAIN_ID".to_string()))?,
            factory_address: addr_var("FACTORY_ADDRESS")?,
            weusd_address: addr_var("WEUSD_ADDRESS")?,
            operator_address: addr_var("OPERATOR_ADDRESS")?,
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| DashboardError::Config("Invalid API_PORT".to_string()))?,
            page_size: env_var("PAGE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| DashboardError::Config("Invalid PAGE_SIZE".to_string()))?,
            receipt_poll_interval: Duration::from_millis(
                env_var("RECEIPT_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .map_err(|_| {
                        DashboardError::Config("Invalid RECEIPT_POLL_INTERVAL_MS".to_string())
                    })?,
            ),
            receipt_timeout: Duration::from_secs(
                env_var("RECEIPT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .map_err(|_| {
                        DashboardError::Config("Invalid RECEIPT_TIMEOUT_SECS".to_string())
                    })?,
            ),
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| DashboardError::Config(format!("Missing env var: {key}")))
}

fn addr_var(key: &str) -> Result<Address> {
    env_var(key)?
        .parse()
        .map_err(|_| DashboardError::Config(format!("Invalid address in {key}")))
}
