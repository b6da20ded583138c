//! Two-step mutation pipeline: allowance check → optional approval →
//! pre-flight simulation → submission → confirmation.
//!
//! No step is ever retried. A failure carries the step it happened in
//! ([`FailReason`]) plus the causing error, and the caller's pending-flag
//! guard clears regardless of which terminal state the run reached.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use launch_core::MAX_AMOUNT;

use crate::contracts::Erc20;
use crate::errors::DashboardError;
use crate::rpc::{EvmClient, TxReceipt};

/// Which step a failed pipeline run died in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    ApprovalFailed,
    SimulationFailed,
    SubmissionFailed,
    Reverted,
}

impl FailReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailReason::ApprovalFailed => "approval failed",
            FailReason::SimulationFailed => "simulation failed",
            FailReason::SubmissionFailed => "submission failed",
            FailReason::Reverted => "transaction reverted",
        }
    }
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{reason}: {source}")]
pub struct PipelineError {
    pub reason: FailReason,
    #[source]
    pub source: DashboardError,
}

/// The value-transferring half of a mutation: `token` must have granted
/// `spender` an allowance of at least `amount` before the call may move
/// funds on the caller's behalf.
#[derive(Debug, Clone)]
pub struct Spending {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

/// The transfer-triggering call itself.
#[derive(Debug, Clone)]
pub struct MutationCall {
    pub to: Address,
    pub data: Bytes,
}

/// Terminal success: the target transaction landed with status 1.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmed {
    pub tx_hash: B256,
    /// Whether an approval transaction had to be confirmed first.
    pub approved: bool,
}

/// Chain operations the pipeline suspends on; mocked in tests.
pub trait Chain {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, DashboardError>;

    async fn simulate(&self, from: Address, to: Address, data: Bytes)
        -> Result<(), DashboardError>;

    async fn submit(&self, from: Address, to: Address, data: Bytes)
        -> Result<B256, DashboardError>;

    async fn confirm(&self, hash: B256) -> Result<TxReceipt, DashboardError>;
}

impl Chain for EvmClient {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, DashboardError> {
        Erc20 {
            client: self,
            address: token,
        }
        .allowance(owner, spender)
        .await
    }

    async fn simulate(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<(), DashboardError> {
        self.simulate_call(from, to, data).await
    }

    async fn submit(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<B256, DashboardError> {
        self.send_transaction(from, to, data).await
    }

    async fn confirm(&self, hash: B256) -> Result<TxReceipt, DashboardError> {
        self.wait_for_receipt(hash).await
    }
}

/// Run one mutation end to end.
///
/// With `spending` present the run starts in Checking-Allowance and enters
/// Approving only when the current allowance is short; the approval is for
/// [`MAX_AMOUNT`], not the exact request, so later actions skip the step.
/// Every run then simulates the target call before submitting it for real.
pub async fn execute<C: Chain>(
    chain: &C,
    from: Address,
    spending: Option<Spending>,
    call: MutationCall,
) -> Result<Confirmed, PipelineError> {
    let mut approved = false;

    if let Some(spending) = spending {
        // Checking-Allowance
        let allowance = chain
            .allowance(spending.token, from, spending.spender)
            .await
            .map_err(|e| fail(FailReason::ApprovalFailed, e))?;

        if allowance >= spending.amount {
            debug!(
                "allowance {allowance} covers requested {}, skipping approval",
                spending.amount
            );
        } else {
            // Approving
            debug!(
                "allowance {allowance} below requested {}, approving {} for {}",
                spending.amount, spending.token, spending.spender
            );
            let data = Erc20::approve_data(spending.spender, MAX_AMOUNT);
            let hash = chain
                .submit(from, spending.token, data)
                .await
                .map_err(|e| fail(FailReason::ApprovalFailed, e))?;
            let receipt = chain
                .confirm(hash)
                .await
                .map_err(|e| fail(FailReason::ApprovalFailed, e))?;
            if !receipt.succeeded() {
                return Err(fail(
                    FailReason::ApprovalFailed,
                    DashboardError::Reverted(hash),
                ));
            }
            approved = true;
        }
    }

    // Submitting: dry run first to catch reverts before spending gas.
    chain
        .simulate(from, call.to, call.data.clone())
        .await
        .map_err(|e| fail(FailReason::SimulationFailed, e))?;

    let hash = chain
        .submit(from, call.to, call.data)
        .await
        .map_err(|e| fail(FailReason::SubmissionFailed, e))?;
    let receipt = chain
        .confirm(hash)
        .await
        .map_err(|e| fail(FailReason::SubmissionFailed, e))?;
    if !receipt.succeeded() {
        return Err(fail(FailReason::Reverted, DashboardError::Reverted(hash)));
    }

    Ok(Confirmed {
        tx_hash: receipt.transaction_hash,
        approved,
    })
}

fn fail(reason: FailReason, source: DashboardError) -> PipelineError {
    PipelineError { reason, source }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use launch_core::{ActionKind, FlagKey, PendingFlags, ProjectId};

    use super::*;

    const OWNER: Address = Address::new([0x0a; 20]);
    const TOKEN: Address = Address::new([0x0b; 20]);
    const SPENDER: Address = Address::new([0x0c; 20]);

    /// Scripted chain: a fixed allowance, switchable failures, and a log of
    /// the steps the pipeline actually took.
    struct MockChain {
        allowance: U256,
        fail_simulation: bool,
        revert_target: bool,
        steps: Mutex<Vec<String>>,
    }

    impl MockChain {
        fn new(allowance: u64) -> Self {
            Self {
                allowance: U256::from(allowance),
                fail_simulation: false,
                revert_target: false,
                steps: Mutex::new(Vec::new()),
            }
        }

        fn log(&self, step: impl Into<String>) {
            self.steps.lock().unwrap().push(step.into());
        }

        fn steps(&self) -> Vec<String> {
            self.steps.lock().unwrap().clone()
        }

        fn receipt(hash: B256, ok: bool) -> TxReceipt {
            TxReceipt {
                transaction_hash: hash,
                block_number: Some("0x1".to_string()),
                status: Some(if ok { "0x1" } else { "0x0" }.to_string()),
            }
        }
    }

    impl Chain for MockChain {
        async fn allowance(
            &self,
            _token: Address,
            _owner: Address,
            _spender: Address,
        ) -> Result<U256, DashboardError> {
            self.log("allowance");
            Ok(self.allowance)
        }

        async fn simulate(
            &self,
            _from: Address,
            _to: Address,
            _data: Bytes,
        ) -> Result<(), DashboardError> {
            self.log("simulate");
            if self.fail_simulation {
                return Err(DashboardError::Rpc {
                    code: -32000,
                    message: "execution reverted".to_string(),
                });
            }
            Ok(())
        }

        async fn submit(
            &self,
            _from: Address,
            to: Address,
            _data: Bytes,
        ) -> Result<B256, DashboardError> {
            if to == TOKEN {
                self.log("submit-approve");
                Ok(B256::with_last_byte(1))
            } else {
                self.log("submit-target");
                Ok(B256::with_last_byte(2))
            }
        }

        async fn confirm(&self, hash: B256) -> Result<TxReceipt, DashboardError> {
            self.log("confirm");
            let ok = !(self.revert_target && hash == B256::with_last_byte(2));
            Ok(Self::receipt(hash, ok))
        }
    }

    fn spending(amount: u64) -> Option<Spending> {
        Some(Spending {
            token: TOKEN,
            spender: SPENDER,
            amount: U256::from(amount),
        })
    }

    fn call() -> MutationCall {
        MutationCall {
            to: SPENDER,
            data: Bytes::from(vec![0xde, 0xad]),
        }
    }

    #[tokio::test]
    async fn sufficient_allowance_skips_approval() {
        let chain = MockChain::new(1000);
        let outcome = execute(&chain, OWNER, spending(500), call()).await.unwrap();
        assert!(!outcome.approved);
        assert_eq!(
            chain.steps(),
            ["allowance", "simulate", "submit-target", "confirm"]
        );
    }

    #[tokio::test]
    async fn short_allowance_approves_first() {
        let chain = MockChain::new(100);
        let outcome = execute(&chain, OWNER, spending(500), call()).await.unwrap();
        assert!(outcome.approved);
        assert_eq!(
            chain.steps(),
            [
                "allowance",
                "submit-approve",
                "confirm",
                "simulate",
                "submit-target",
                "confirm"
            ]
        );
    }

    #[tokio::test]
    async fn no_spending_goes_straight_to_submitting() {
        let chain = MockChain::new(0);
        let outcome = execute(&chain, OWNER, None, call()).await.unwrap();
        assert!(!outcome.approved);
        assert_eq!(chain.steps(), ["simulate", "submit-target", "confirm"]);
    }

    #[tokio::test]
    async fn simulation_failure_surfaces_and_clears_the_flag() {
        let flags = Arc::new(PendingFlags::new());
        let key = FlagKey {
            project: ProjectId(1),
            action: ActionKind::Buy,
        };

        let mut chain = MockChain::new(1000);
        chain.fail_simulation = true;

        let result = {
            let _guard = flags.begin(key).unwrap();
            execute(&chain, OWNER, spending(500), call()).await
        };

        let err = result.unwrap_err();
        assert_eq!(err.reason, FailReason::SimulationFailed);
        // No transaction was submitted after the failed dry run.
        assert_eq!(chain.steps(), ["allowance", "simulate"]);
        // The guard cleared the pending flag despite the failure.
        assert!(!flags.is_pending(key));
    }

    #[tokio::test]
    async fn reverted_target_reports_reverted() {
        let mut chain = MockChain::new(1000);
        chain.revert_target = true;
        let err = execute(&chain, OWNER, spending(500), call())
            .await
            .unwrap_err();
        assert_eq!(err.reason, FailReason::Reverted);
    }

    #[tokio::test]
    async fn approval_errors_carry_their_reason() {
        struct FailingAllowance;
        impl Chain for FailingAllowance {
            async fn allowance(
                &self,
                _t: Address,
                _o: Address,
                _s: Address,
            ) -> Result<U256, DashboardError> {
                Err(DashboardError::Rpc {
                    code: -32000,
                    message: "boom".to_string(),
                })
            }
            async fn simulate(
                &self,
                _f: Address,
                _t: Address,
                _d: Bytes,
            ) -> Result<(), DashboardError> {
                Ok(())
            }
            async fn submit(
                &self,
                _f: Address,
                _t: Address,
                _d: Bytes,
            ) -> Result<B256, DashboardError> {
                Ok(B256::ZERO)
            }
            async fn confirm(&self, hash: B256) -> Result<TxReceipt, DashboardError> {
                Ok(MockChain::receipt(hash, true))
            }
        }

        let err = execute(&FailingAllowance, OWNER, spending(1), call())
            .await
            .unwrap_err();
        assert_eq!(err.reason, FailReason::ApprovalFailed);
        assert!(err.to_string().contains("boom"));
    }
}
