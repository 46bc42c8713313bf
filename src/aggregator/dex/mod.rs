//! Exchange implementations
//!
//! A [`Dex`] knows how to discover its pools and how to price a swap against
//! one of them. Pricing is pure; discovery and state refresh go over the network.

use async_trait::async_trait;
use num::BigInt;

use super::asset::Token;
use super::pool::LiquidityPool;
use super::provider::{DataProvider, ProviderError};

pub mod vyfinance;

pub use vyfinance::VyFinance;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DexError {
    #[error("Token {token} is not part of pool {pool}")]
    TokenNotInPool { token: String, pool: String },

    #[error("Pool {0} has no liquidity")]
    EmptyReserves(String),

    #[error("Swap amount must be positive")]
    NonPositiveAmount,
}

/// Fee charged (or deposited) when placing a swap order
#[derive(Debug, Clone, PartialEq)]
pub struct SwapFee {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Lovelace
    pub value: BigInt,
    pub is_returned: bool,
}

#[async_trait]
pub trait Dex: Send + Sync {
    fn name(&self) -> &str;

    /// Every pool the exchange lists, with the reserves it reports
    async fn liquidity_pools(&self) -> Result<Vec<LiquidityPool>, ProviderError>;

    /// Re-read reserves from the pool UTxO on chain
    async fn liquidity_pool_state(
        &self,
        pool: &LiquidityPool,
        provider: &dyn DataProvider,
    ) -> Result<LiquidityPool, ProviderError> {
        refresh_reserves(pool, provider).await
    }

    fn estimated_receive(
        &self,
        pool: &LiquidityPool,
        token_in: &Token,
        amount_in: &BigInt,
    ) -> Result<BigInt, DexError>;

    fn price_impact_percent(
        &self,
        pool: &LiquidityPool,
        token_in: &Token,
        amount_in: &BigInt,
    ) -> Result<f64, DexError>;

    fn swap_order_fees(&self) -> Vec<SwapFee>;
}

/// Reserves are the pool-side balances of the UTxO holding the pool NFT.
/// Pools without a known NFT are returned unchanged.
pub async fn refresh_reserves(
    pool: &LiquidityPool,
    provider: &dyn DataProvider,
) -> Result<LiquidityPool, ProviderError> {
    let Some(nft) = &pool.nft else {
        return Ok(pool.clone());
    };

    let nft_unit = nft.identifier("");
    let utxos = provider.utxos_with_asset(&pool.address, &nft_unit).await?;
    let Some(utxo) = utxos.iter().find(|utxo| utxo.holds(&nft_unit)) else {
        tracing::warn!(
            "No UTxO at {} holds pool NFT {}, keeping listed reserves",
            pool.address,
            nft_unit
        );
        return Ok(pool.clone());
    };

    let mut refreshed = pool.clone();
    refreshed.reserve_a = utxo.quantity_of(&pool.asset_a.unit());
    refreshed.reserve_b = utxo.quantity_of(&pool.asset_b.unit());
    Ok(refreshed)
}
