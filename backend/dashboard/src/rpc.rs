//! EVM JSON-RPC client — typed reads, pre-flight simulation, transaction
//! submission, and receipt polling over `reqwest`.
//!
//! Transaction signing is delegated to the node-managed operator account
//! (`eth_sendTransaction`); wallet session handling is out of scope. No
//! request is retried — every failure surfaces to the caller with the
//! original error.

use std::time::Duration;

use alloy_primitives::{hex, Address, Bytes, B256};
use alloy_sol_types::SolCall;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{DashboardError, Result};

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// The receipt fields the dashboard cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct TxReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: B256,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<String>,
    pub status: Option<String>,
}

impl TxReceipt {
    /// `status` is `0x1` on success and `0x0` when the execution reverted.
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EvmClient {
    http: Client,
    rpc_url: String,
    chain_id: u64,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

impl EvmClient {
    pub fn new(
        http: Client,
        rpc_url: impl Into<String>,
        chain_id: u64,
        receipt_poll_interval: Duration,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
            chain_id,
            receipt_poll_interval,
            receipt_timeout,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let body: RpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            }))
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = body.error {
            return Err(DashboardError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result.ok_or_else(|| DashboardError::Rpc {
            code: 0,
            message: format!("empty result from {method}"),
        })
    }

    /// Read-only contract call (`eth_call`), decoded through the call's ABI.
    pub async fn call<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        let data = self
            .eth_call_raw(None, to, call.abi_encode().into())
            .await?;
        C::abi_decode_returns(&data).map_err(|e| DashboardError::AbiDecode(e.to_string()))
    }

    /// Dry-run `data` from `from` against current state. A revert comes back
    /// as an RPC error; success discards the return data.
    pub async fn simulate_call(&self, from: Address, to: Address, data: Bytes) -> Result<()> {
        self.eth_call_raw(Some(from), to, data).await.map(|_| ())
    }

    async fn eth_call_raw(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
    ) -> Result<Vec<u8>> {
        let mut tx = json!({ "to": to, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        let raw = self.request("eth_call", json!([tx, "latest"])).await?;
        let encoded = raw.as_str().ok_or_else(|| {
            DashboardError::AbiDecode("eth_call returned a non-string result".to_string())
        })?;
        hex::decode(encoded).map_err(|e| DashboardError::AbiDecode(e.to_string()))
    }

    /// Submit a transaction through the node-managed `from` account.
    pub async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<B256> {
        let tx = json!({
            "from": from,
            "to": to,
            "data": data,
            "chainId": format!("0x{:x}", self.chain_id),
        });
        let raw = self.request("eth_sendTransaction", json!([tx])).await?;
        let hash: B256 = serde_json::from_value(raw)?;
        debug!("submitted transaction {hash}");
        Ok(hash)
    }

    /// Poll for the receipt of `hash` until it lands or the timeout expires.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            let raw = self
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if !raw.is_null() {
                let receipt: TxReceipt = serde_json::from_value(raw)?;
                debug!(
                    "transaction {hash} confirmed in block {:?}",
                    receipt.block_number
                );
                return Ok(receipt);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DashboardError::ReceiptTimeout(hash));
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_status_parses() {
        let ok: TxReceipt = serde_json::from_value(json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "status": "0x1",
        }))
        .unwrap();
        assert!(ok.succeeded());

        let reverted: TxReceipt = serde_json::from_value(json!({
            "transactionHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "blockNumber": "0x10",
            "status": "0x0",
        }))
        .unwrap();
        assert!(!reverted.succeeded());
    }

    #[test]
    fn rpc_error_body_decodes() {
        let body: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted" },
        }))
        .unwrap();
        let err = body.error.unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "execution reverted");
        assert!(body.result.is_none());
    }
}
