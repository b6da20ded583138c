//! Project listing and creation payloads.
//!
//! The listing is rebuilt wholesale on every refresh: paginated factory
//! reads plus a fresh per-project phase from each GLA contract. The
//! creation payload mirrors the dashboard form — GLA price/cap fields
//! travel as decimal strings and are encoded to base units here, never as
//! floats.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::warn;

use launch_core::{to_base_units, to_decimal_string, Phase, WEUSD_DECIMALS};

use crate::contracts::{
    BankParams, Factory, Gla, GlaParams, MarketFeeParams, MarketPriceParams, PriceFormulaParams,
    ProjectConfig, ProjectInfo, StakeFeeParams, StakeRewardParams, TokenParams,
};
use crate::errors::{DashboardError, Result};
use crate::rpc::EvmClient;

// ─────────────────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────────────────

/// One row of the dashboard listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: u64,
    pub name: String,
    pub owner: Address,
    pub rwa_token: Address,
    pub pr_rwa_token: Address,
    pub stable_rwa_token: Address,
    pub gla_contract: Address,
    pub bank_contract: Address,
    pub market_contract: Address,
    pub stake_pool_contract: Address,
    pub helper_contract: Address,
    /// Absent when the GLA contract reported a phase code we don't know.
    pub phase: Option<Phase>,
}

/// Fetch the first page and, when more projects exist, the tail page, then
/// resolve each project's phase. The result replaces any previous listing.
pub async fn list_projects(
    client: &EvmClient,
    factory_address: Address,
    page_size: u64,
) -> Result<Vec<ProjectRecord>> {
    let factory = Factory {
        client,
        address: factory_address,
    };
    let limit = U256::from(page_size);

    let (mut infos, total) = factory.projects_paginated(U256::ZERO, limit).await?;
    if total > limit {
        let (tail, _) = factory.projects_paginated(total - limit, total).await?;
        merge_tail(&mut infos, tail);
    }

    let mut records = Vec::with_capacity(infos.len());
    for info in infos {
        records.push(into_record(client, info).await?);
    }
    Ok(records)
}

pub async fn find_project(
    client: &EvmClient,
    factory_address: Address,
    page_size: u64,
    id: u64,
) -> Result<ProjectRecord> {
    list_projects(client, factory_address, page_size)
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or(DashboardError::ProjectNotFound(id))
}

/// Append tail-page entries not already present; the two pages may overlap.
fn merge_tail(infos: &mut Vec<ProjectInfo>, tail: Vec<ProjectInfo>) {
    for info in tail {
        if !infos.iter().any(|p| p.id == info.id) {
            infos.push(info);
        }
    }
}

async fn into_record(client: &EvmClient, info: ProjectInfo) -> Result<ProjectRecord> {
    let id = u64::try_from(info.id)
        .map_err(|_| DashboardError::AbiDecode(format!("project id {} overflows u64", info.id)))?;

    let gla = Gla {
        client,
        address: info.glaContract,
    };
    // An unknown code spoils this project's phase, not the whole refresh;
    // a transport failure still fails the batch.
    let phase = match Phase::from_code(gla.phase_code().await?) {
        Ok(phase) => Some(phase),
        Err(e) => {
            warn!("project {id}: {e}");
            None
        }
    };

    Ok(ProjectRecord {
        id,
        name: info.name,
        owner: info.owner,
        rwa_token: info.rwaToken,
        pr_rwa_token: info.prRwaToken,
        stable_rwa_token: info.stableRwaToken,
        gla_contract: info.glaContract,
        bank_contract: info.bankContract,
        market_contract: info.marketContract,
        stake_pool_contract: info.stakePoolContract,
        helper_contract: info.helperContract,
        phase,
    })
}

// ─────────────────────────────────────────────────────────
// Creation payload
// ─────────────────────────────────────────────────────────

/// The full creation form. `config` doubles as the preset-response shape so
/// a fetched preset can be edited and submitted back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub project_name: String,
    #[serde(flatten)]
    pub config: ProjectConfigPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfigPayload {
    pub tokens: TokensPayload,
    pub bank: BankPayload,
    pub market_price: MarketPricePayload,
    pub market_fee: MarketFeePayload,
    pub price_formula: PriceFormulaPayload,
    pub stake_reward: StakeRewardPayload,
    pub stake_fee: StakeFeePayload,
    pub gla: GlaPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensPayload {
    pub rwa_name: String,
    pub rwa_symbol: String,
    pub pr_rwa_name: String,
    pub pr_rwa_symbol: String,
    pub stable_rwa_name: String,
    pub stable_rwa_symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankPayload {
    pub dev: String,
    pub borrow_fee: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPricePayload {
    pub target: u64,
    pub target_adjusted: u64,
    pub min_target: u64,
    pub max_target_adjusted: u64,
    pub raise_step: u64,
    pub lower_step: u64,
    pub lower_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFeePayload {
    pub dev: String,
    pub buy_fee: u64,
    pub sell_fee: u64,
}

/// Price-formula constants travel as raw base-unit integer strings, exactly
/// as the form submitted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFormulaPayload {
    pub k: String,
    pub initial_price: String,
    pub floor_price: String,
    pub floor_supply: String,
    pub initial_worth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRewardPayload {
    pub mint_percent_per_day: u64,
    pub blocks_per_day: u64,
    pub total_alloc_point: u64,
    pub rwa_pool_alloc: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeFeePayload {
    pub dev: String,
    pub withdraw_fee: u64,
    pub mint_fee: u64,
}

/// GLA timing/price/cap parameters. The five price/cap fields are decimal
/// WEUSD strings; intervals are seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlaPayload {
    pub before_whitelist_interval: u64,
    pub whitelist_interval: u64,
    pub public_offering_interval: u64,
    pub init_interval: u64,
    pub whitelist_price: String,
    pub public_offering_price: String,
    pub soft_cap: String,
    pub hard_cap: String,
    pub whitelist_max_cap_per_user: String,
    pub weusd_token: String,
}

impl ProjectConfigPayload {
    /// Encode the form payload into the on-chain config struct. Decimal
    /// WEUSD fields pass through the fixed-point codec at `scale`; raw
    /// integer strings are scale-0 amounts through the same codec.
    pub fn into_config(self, scale: u32) -> Result<ProjectConfig> {
        Ok(ProjectConfig {
            tokens: TokenParams {
                rwaName: self.tokens.rwa_name,
                rwaSymbol: self.tokens.rwa_symbol,
                prRwaName: self.tokens.pr_rwa_name,
                prRwaSymbol: self.tokens.pr_rwa_symbol,
                stableRwaName: self.tokens.stable_rwa_name,
                stableRwaSymbol: self.tokens.stable_rwa_symbol,
            },
            bank: BankParams {
                dev: parse_address(&self.bank.dev)?,
                borrowFee: U256::from(self.bank.borrow_fee),
            },
            marketPrice: MarketPriceParams {
                target: U256::from(self.market_price.target),
                targetAdjusted: U256::from(self.market_price.target_adjusted),
                minTarget: U256::from(self.market_price.min_target),
                maxTargetAdjusted: U256::from(self.market_price.max_target_adjusted),
                raiseStep: U256::from(self.market_price.raise_step),
                lowerStep: U256::from(self.market_price.lower_step),
                lowerInterval: U256::from(self.market_price.lower_interval),
            },
            marketFee: MarketFeeParams {
                dev: parse_address(&self.market_fee.dev)?,
                buyFee: U256::from(self.market_fee.buy_fee),
                sellFee: U256::from(self.market_fee.sell_fee),
            },
            priceFormula: PriceFormulaParams {
                k: to_base_units(&self.price_formula.k, 0)?,
                initialPrice: to_base_units(&self.price_formula.initial_price, 0)?,
                floorPrice: to_base_units(&self.price_formula.floor_price, 0)?,
                floorSupply: to_base_units(&self.price_formula.floor_supply, 0)?,
                initialWorth: to_base_units(&self.price_formula.initial_worth, 0)?,
            },
            stakeReward: StakeRewardParams {
                mintPercentPerDay: U256::from(self.stake_reward.mint_percent_per_day),
                blocksPerDay: U256::from(self.stake_reward.blocks_per_day),
                totalAllocPoint: U256::from(self.stake_reward.total_alloc_point),
                rwaPoolAlloc: U256::from(self.stake_reward.rwa_pool_alloc),
            },
            stakeFee: StakeFeeParams {
                dev: parse_address(&self.stake_fee.dev)?,
                withdrawFee: U256::from(self.stake_fee.withdraw_fee),
                mintFee: U256::from(self.stake_fee.mint_fee),
            },
            gla: GlaParams {
                beforeWhitelistInterval: U256::from(self.gla.before_whitelist_interval),
                whitelistInterval: U256::from(self.gla.whitelist_interval),
                publicOfferingInterval: U256::from(self.gla.public_offering_interval),
                initInterval: U256::from(self.gla.init_interval),
                whitelistPrice: to_base_units(&self.gla.whitelist_price, scale)?,
                publicOfferingPrice: to_base_units(&self.gla.public_offering_price, scale)?,
                softCap: to_base_units(&self.gla.soft_cap, scale)?,
                hardCap: to_base_units(&self.gla.hard_cap, scale)?,
                whitelistMaxCapPerUser: to_base_units(&self.gla.whitelist_max_cap_per_user, scale)?,
                weusdToken: parse_address(&self.gla.weusd_token)?,
            },
        })
    }

    /// Render a factory preset back into the form shape, with the GLA
    /// base-unit fields as decimal strings for prefill.
    pub fn from_config(config: ProjectConfig, scale: u32) -> Result<Self> {
        Ok(Self {
            tokens: TokensPayload {
                rwa_name: config.tokens.rwaName,
                rwa_symbol: config.tokens.rwaSymbol,
                pr_rwa_name: config.tokens.prRwaName,
                pr_rwa_symbol: config.tokens.prRwaSymbol,
                stable_rwa_name: config.tokens.stableRwaName,
                stable_rwa_symbol: config.tokens.stableRwaSymbol,
            },
            bank: BankPayload {
                dev: config.bank.dev.to_string(),
                borrow_fee: small(config.bank.borrowFee)?,
            },
            market_price: MarketPricePayload {
                target: small(config.marketPrice.target)?,
                target_adjusted: small(config.marketPrice.targetAdjusted)?,
                min_target: small(config.marketPrice.minTarget)?,
                max_target_adjusted: small(config.marketPrice.maxTargetAdjusted)?,
                raise_step: small(config.marketPrice.raiseStep)?,
                lower_step: small(config.marketPrice.lowerStep)?,
                lower_interval: small(config.marketPrice.lowerInterval)?,
            },
            market_fee: MarketFeePayload {
                dev: config.marketFee.dev.to_string(),
                buy_fee: small(config.marketFee.buyFee)?,
                sell_fee: small(config.marketFee.sellFee)?,
            },
            price_formula: PriceFormulaPayload {
                k: config.priceFormula.k.to_string(),
                initial_price: config.priceFormula.initialPrice.to_string(),
                floor_price: config.priceFormula.floorPrice.to_string(),
                floor_supply: config.priceFormula.floorSupply.to_string(),
                initial_worth: config.priceFormula.initialWorth.to_string(),
            },
            stake_reward: StakeRewardPayload {
                mint_percent_per_day: small(config.stakeReward.mintPercentPerDay)?,
                blocks_per_day: small(config.stakeReward.blocksPerDay)?,
                total_alloc_point: small(config.stakeReward.totalAllocPoint)?,
                rwa_pool_alloc: small(config.stakeReward.rwaPoolAlloc)?,
            },
            stake_fee: StakeFeePayload {
                dev: config.stakeFee.dev.to_string(),
                withdraw_fee: small(config.stakeFee.withdrawFee)?,
                mint_fee: small(config.stakeFee.mintFee)?,
            },
            gla: GlaPayload {
                before_whitelist_interval: small(config.gla.beforeWhitelistInterval)?,
                whitelist_interval: small(config.gla.whitelistInterval)?,
                public_offering_interval: small(config.gla.publicOfferingInterval)?,
                init_interval: small(config.gla.initInterval)?,
                whitelist_price: to_decimal_string(config.gla.whitelistPrice, scale),
                public_offering_price: to_decimal_string(config.gla.publicOfferingPrice, scale),
                soft_cap: to_decimal_string(config.gla.softCap, scale),
                hard_cap: to_decimal_string(config.gla.hardCap, scale),
                whitelist_max_cap_per_user: to_decimal_string(
                    config.gla.whitelistMaxCapPerUser,
                    scale,
                ),
                weusd_token: config.gla.weusdToken.to_string(),
            },
        })
    }
}

impl CreateProjectRequest {
    pub fn into_call(self) -> Result<(String, ProjectConfig)> {
        let config = self.config.into_config(WEUSD_DECIMALS)?;
        Ok((self.project_name, config))
    }
}

pub fn parse_address(s: &str) -> Result<Address> {
    s.parse()
        .map_err(|_| DashboardError::InvalidAddress(s.to_string()))
}

fn small(value: U256) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| DashboardError::AbiDecode(format!("config field {value} overflows u64")))
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
