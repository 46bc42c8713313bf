//! VyFinance constant-product exchange
//!
//! Pools are discovered through the VyFi pool registry API; each registry
//! entry carries the pool address, the asset pair, the LP token, the pool
//! NFT and the fee settings (in basis points).

use async_trait::async_trait;
use num::{BigInt, Signed, ToPrimitive, Zero};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{Dex, DexError, SwapFee};
use crate::aggregator::asset::{Asset, Token, LOVELACE};
use crate::aggregator::http::{json_body, send_with_retries, RequestPolicy};
use crate::aggregator::pool::LiquidityPool;
use crate::aggregator::provider::ProviderError;

pub const IDENTIFIER: &str = "VyFinance";
pub const DEFAULT_API_URL: &str = "https://api.vyfi.io";

const SOURCE: &str = "VyFi API";
const FEE_MULTIPLIER: i64 = 10_000;
/// Batcher fee, lovelace
const PROCESS_FEE: u64 = 1_900_000;
/// Held in the order UTxO and returned once processed, lovelace
const MIN_ADA: u64 = 2_000_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolEntry {
    units_pair: String,
    pool_validator_utxo_address: String,
    #[serde(rename = "lpPolicyId-assetId")]
    lp_policy_asset: String,
    /// Embedded JSON document with the pool NFT and fee settings
    json: String,
    #[serde(default)]
    token_a_quantity: Option<serde_json::Value>,
    #[serde(default)]
    token_b_quantity: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolDetails {
    #[serde(rename = "mainNFT")]
    main_nft: Option<NftDetails>,
    fees_settings: FeeSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NftDetails {
    currency_symbol: String,
    token_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeSettings {
    bar_fee: f64,
    liq_fee: f64,
}

fn decode_error(message: String) -> ProviderError {
    ProviderError::Decode {
        source_name: SOURCE,
        message,
    }
}

fn parse_unit(unit: &str) -> Result<Token, ProviderError> {
    if unit == LOVELACE {
        return Ok(Token::Lovelace);
    }
    Asset::from_identifier(unit, 0)
        .map(Token::Asset)
        .map_err(|e| decode_error(e.to_string()))
}

/// A missing quantity is zero until refreshed on chain; a malformed one is an error
fn parse_reserve(value: Option<&serde_json::Value>) -> Result<BigInt, ProviderError> {
    let raw = match value {
        None | Some(serde_json::Value::Null) => return Ok(BigInt::zero()),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    raw.parse()
        .map_err(|_| decode_error(format!("invalid reserve quantity '{raw}'")))
}

impl PoolEntry {
    fn into_pool(self) -> Result<LiquidityPool, ProviderError> {
        let (unit_a, unit_b) = self
            .units_pair
            .split_once('/')
            .ok_or_else(|| decode_error(format!("invalid units pair '{}'", self.units_pair)))?;

        let details: PoolDetails =
            serde_json::from_str(&self.json).map_err(|e| decode_error(e.to_string()))?;

        let mut pool = LiquidityPool::new(
            IDENTIFIER,
            &self.pool_validator_utxo_address,
            parse_unit(unit_a)?,
            parse_unit(unit_b)?,
            parse_reserve(self.token_a_quantity.as_ref())?,
            parse_reserve(self.token_b_quantity.as_ref())?,
        );

        // Fees are reported in basis points
        pool.pool_fee_percent =
            (details.fees_settings.bar_fee + details.fees_settings.liq_fee) / 100.0;

        if let Some((policy, name)) = self.lp_policy_asset.split_once('-') {
            if let Ok(lp_token) = Asset::new(policy, name, 0) {
                pool.identifier = lp_token.identifier("");
                pool.lp_token = Some(lp_token);
            }
        }

        pool.nft = details
            .main_nft
            .and_then(|nft| Asset::new(&nft.currency_symbol, &nft.token_name, 0).ok());

        Ok(pool)
    }
}

#[derive(Debug, Clone)]
pub struct VyFinance {
    client: Client,
    api_url: Url,
    policy: RequestPolicy,
}

impl VyFinance {
    pub fn new(api_url: Url, policy: RequestPolicy) -> Result<Self, ProviderError> {
        Ok(Self {
            client: policy.build_client(SOURCE)?,
            api_url,
            policy,
        })
    }

    /// (fee_multiplier, fee_modifier) for the pool's fee percentage
    fn fee_terms(pool: &LiquidityPool) -> (BigInt, BigInt) {
        let fee_bps = (pool.pool_fee_percent / 100.0 * FEE_MULTIPLIER as f64).round() as i64;
        (
            BigInt::from(FEE_MULTIPLIER),
            BigInt::from(FEE_MULTIPLIER - fee_bps),
        )
    }

    fn checked_reserves<'a>(
        pool: &'a LiquidityPool,
        token_in: &Token,
        amount_in: &BigInt,
    ) -> Result<(&'a BigInt, &'a BigInt), DexError> {
        if !amount_in.is_positive() {
            return Err(DexError::NonPositiveAmount);
        }
        let (reserve_in, reserve_out) =
            pool.reserves_for(token_in).ok_or_else(|| DexError::TokenNotInPool {
                token: token_in.to_string(),
                pool: pool.pair(),
            })?;
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(DexError::EmptyReserves(pool.pair()));
        }
        Ok((reserve_in, reserve_out))
    }
}

#[async_trait]
impl Dex for VyFinance {
    fn name(&self) -> &str {
        IDENTIFIER
    }

    async fn liquidity_pools(&self) -> Result<Vec<LiquidityPool>, ProviderError> {
        let url = format!("{}/lp", self.api_url.as_str().trim_end_matches('/'));
        let response = send_with_retries(SOURCE, &url, &self.policy, || {
            self.client
                .get(&url)
                .query(&[("networkId", "1"), ("v2", "true")])
        })
        .await?;

        let entries: Vec<PoolEntry> = json_body(SOURCE, &url, response).await?;
        let mut pools = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.into_pool() {
                Ok(pool) => pools.push(pool),
                Err(e) => tracing::warn!("Skipping VyFinance pool entry: {}", e),
            }
        }

        tracing::debug!("VyFi API listed {} pools", pools.len());
        Ok(pools)
    }

    fn estimated_receive(
        &self,
        pool: &LiquidityPool,
        token_in: &Token,
        amount_in: &BigInt,
    ) -> Result<BigInt, DexError> {
        let (reserve_in, reserve_out) = Self::checked_reserves(pool, token_in, amount_in)?;
        let (fee_multiplier, fee_modifier) = Self::fee_terms(pool);

        let numerator = amount_in * reserve_out * &fee_modifier;
        let denominator = amount_in * &fee_modifier + reserve_in * &fee_multiplier;
        Ok(numerator / denominator)
    }

    fn price_impact_percent(
        &self,
        pool: &LiquidityPool,
        token_in: &Token,
        amount_in: &BigInt,
    ) -> Result<f64, DexError> {
        let (reserve_in, reserve_out) = Self::checked_reserves(pool, token_in, amount_in)?;
        let (fee_multiplier, fee_modifier) = Self::fee_terms(pool);

        let swap_out_numerator = amount_in * &fee_modifier * reserve_out;
        let swap_out_denominator = amount_in * &fee_modifier + reserve_in * &fee_multiplier;

        let impact_numerator = reserve_out * amount_in * &swap_out_denominator * &fee_modifier
            - &swap_out_numerator * reserve_in * &fee_multiplier;
        let impact_denominator = reserve_out * amount_in * &swap_out_denominator * &fee_multiplier;

        let numerator = (impact_numerator * BigInt::from(100)).to_f64().unwrap_or(f64::NAN);
        let denominator = impact_denominator.to_f64().unwrap_or(f64::NAN);
        Ok(numerator / denominator)
    }

    fn swap_order_fees(&self) -> Vec<SwapFee> {
        vec![
            SwapFee {
                id: "processFee".to_string(),
                title: "Process Fee".to_string(),
                description: "Fee paid for the service of off-chain batcher to process transactions."
                    .to_string(),
                value: BigInt::from(PROCESS_FEE),
                is_returned: false,
            },
            SwapFee {
                id: "minAda".to_string(),
                title: "MinADA".to_string(),
                description:
                    "MinADA will be held in the UTxO and returned when the order is processed."
                        .to_string(),
                value: BigInt::from(MIN_ADA),
                is_returned: true,
            },
        ]
    }
}
