//! Application-wide error types.

use alloy_primitives::B256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ABI decode error: {0}")]
    AbiDecode(String),

    #[error(transparent)]
    Amount(#[from] launch_core::AmountError),

    #[error(transparent)]
    Phase(#[from] launch_core::PhaseError),

    #[error("address required")]
    AddressRequired,

    #[error("amount required")]
    AmountRequired,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("project {0} not found")]
    ProjectNotFound(u64),

    #[error("timed out waiting for receipt of {0}")]
    ReceiptTimeout(B256),

    #[error("transaction {0} reverted")]
    Reverted(B256),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
