//! Typed bindings for the fixed contract ABI boundary: the project factory,
//! the GLA launch contract, the market, and ERC-20 allowance/approval.
//!
//! Read calls go through [`EvmClient::call`]; mutating calls only build
//! their calldata here — the pipeline owns simulation, submission, and
//! confirmation.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::errors::Result;
use crate::rpc::EvmClient;

sol! {
    #[derive(Debug)]
    struct TokenParams {
        string rwaName;
        string rwaSymbol;
        string prRwaName;
        string prRwaSymbol;
        string stableRwaName;
        string stableRwaSymbol;
    }

    #[derive(Debug)]
    struct BankParams {
        address dev;
        uint256 borrowFee;
    }

    #[derive(Debug)]
    struct MarketPriceParams {
        uint256 target;
        uint256 targetAdjusted;
        uint256 minTarget;
        uint256 maxTargetAdjusted;
        uint256 raiseStep;
        uint256 lowerStep;
        uint256 lowerInterval;
    }

    #[derive(Debug)]
    struct MarketFeeParams {
        address dev;
        uint256 buyFee;
        uint256 sellFee;
    }

    #[derive(Debug)]
    struct PriceFormulaParams {
        uint256 k;
        uint256 initialPrice;
        uint256 floorPrice;
        uint256 floorSupply;
        uint256 initialWorth;
    }

    #[derive(Debug)]
    struct StakeRewardParams {
        uint256 mintPercentPerDay;
        uint256 blocksPerDay;
        uint256 totalAllocPoint;
        uint256 rwaPoolAlloc;
    }

    #[derive(Debug)]
    struct StakeFeeParams {
        address dev;
        uint256 withdrawFee;
        uint256 mintFee;
    }

    #[derive(Debug)]
    struct GlaParams {
        uint256 beforeWhitelistInterval;
        uint256 whitelistInterval;
        uint256 publicOfferingInterval;
        uint256 initInterval;
        uint256 whitelistPrice;
        uint256 publicOfferingPrice;
        uint256 softCap;
        uint256 hardCap;
        uint256 whitelistMaxCapPerUser;
        address weusdToken;
    }

    #[derive(Debug)]
    struct ProjectConfig {
        TokenParams tokens;
        BankParams bank;
        MarketPriceParams marketPrice;
        MarketFeeParams marketFee;
        PriceFormulaParams priceFormula;
        StakeRewardParams stakeReward;
        StakeFeeParams stakeFee;
        GlaParams gla;
    }

    #[derive(Debug)]
    struct ProjectInfo {
        uint256 id;
        string name;
        address owner;
        address rwaToken;
        address prRwaToken;
        address stableRwaToken;
        address glaContract;
        address bankContract;
        address marketContract;
        address stakePoolContract;
        address helperContract;
    }

    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IGla {
        function getPhase() external view returns (uint8);
        function addWhitelist(address[] users) external;
        function whitelistBuy(uint256 amount) external;
        function publicOfferingBuy(uint256 amount) external;
        function initialize() external;
        function withdraw() external;
        function claim() external;
    }

    interface IMarket {
        function buy(address token, uint256 amount, uint256 minOut) external;
        function sell(address token, uint256 amount, uint256 minOut) external;
    }

    interface IFactory {
        function getProjectsPaginated(uint256 offset, uint256 limit) external view returns (ProjectInfo[] list, uint256 totalCount);
        function createProject(string name, ProjectConfig config) external;
        function getConservativeConfig() external view returns (ProjectConfig config);
        function getAggressiveConfig() external view returns (ProjectConfig config);
        function getBalancedConfig() external view returns (ProjectConfig config);
    }
}

/// The three factory-provided preset profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetProfile {
    Conservative,
    Balanced,
    Aggressive,
}

impl PresetProfile {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conservative" => Some(Self::Conservative),
            "balanced" => Some(Self::Balanced),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Contract helpers
// ─────────────────────────────────────────────────────────

pub struct Factory<'a> {
    pub client: &'a EvmClient,
    pub address: Address,
}

impl Factory<'_> {
    pub async fn projects_paginated(
        &self,
        offset: U256,
        limit: U256,
    ) -> Result<(Vec<ProjectInfo>, U256)> {
        let ret = self
            .client
            .call(
                self.address,
                IFactory::getProjectsPaginatedCall { offset, limit },
            )
            .await?;
        Ok((ret.list, ret.totalCount))
    }

    pub async fn preset_config(&self, profile: PresetProfile) -> Result<ProjectConfig> {
        match profile {
            PresetProfile::Conservative => {
                self.client
                    .call(self.address, IFactory::getConservativeConfigCall {})
                    .await
            }
            PresetProfile::Balanced => {
                self.client
                    .call(self.address, IFactory::getBalancedConfigCall {})
                    .await
            }
            PresetProfile::Aggressive => {
                self.client
                    .call(self.address, IFactory::getAggressiveConfigCall {})
                    .await
            }
        }
    }

    pub fn create_project_data(name: String, config: ProjectConfig) -> Bytes {
        IFactory::createProjectCall { name, config }.abi_encode().into()
    }
}

pub struct Gla<'a> {
    pub client: &'a EvmClient,
    pub address: Address,
}

impl Gla<'_> {
    pub async fn phase_code(&self) -> Result<u8> {
        self.client.call(self.address, IGla::getPhaseCall {}).await
    }

    pub fn add_whitelist_data(users: Vec<Address>) -> Bytes {
        IGla::addWhitelistCall { users }.abi_encode().into()
    }

    pub fn whitelist_buy_data(amount: U256) -> Bytes {
        IGla::whitelistBuyCall { amount }.abi_encode().into()
    }

    pub fn public_offering_buy_data(amount: U256) -> Bytes {
        IGla::publicOfferingBuyCall { amount }.abi_encode().into()
    }

    pub fn initialize_data() -> Bytes {
        IGla::initializeCall {}.abi_encode().into()
    }

    pub fn withdraw_data() -> Bytes {
        IGla::withdrawCall {}.abi_encode().into()
    }

    pub fn claim_data() -> Bytes {
        IGla::claimCall {}.abi_encode().into()
    }
}

pub struct Market;

impl Market {
    /// `minOut` is pinned to zero, as the dashboard always submitted it.
    pub fn buy_data(token: Address, amount: U256) -> Bytes {
        IMarket::buyCall {
            token,
            amount,
            minOut: U256::ZERO,
        }
        .abi_encode()
        .into()
    }

    pub fn sell_data(token: Address, amount: U256) -> Bytes {
        IMarket::sellCall {
            token,
            amount,
            minOut: U256::ZERO,
        }
        .abi_encode()
        .into()
    }
}

pub struct Erc20<'a> {
    pub client: &'a EvmClient,
    pub address: Address,
}

impl Erc20<'_> {
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.client
            .call(self.address, IERC20::allowanceCall { owner, spender })
            .await
    }

    pub fn approve_data(spender: Address, amount: U256) -> Bytes {
        IERC20::approveCall { spender, amount }.abi_encode().into()
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
