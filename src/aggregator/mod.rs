//! Cardano DEX aggregation client
//!
//! Owns the registered exchanges and the (single) chain data provider.
//! Callers build queries with [`Aggregator::new_fetch_request`] and price
//! swaps through the [`Dex`] returned by [`Aggregator::dex_by_name`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;

pub mod asset;
pub mod dex;
pub mod fetch;
pub mod http;
pub mod pool;
pub mod provider;

pub use asset::{parse_asset, Asset, AssetError, Token};
pub use dex::{Dex, DexError, SwapFee, VyFinance};
pub use fetch::FetchRequest;
pub use http::RequestPolicy;
pub use pool::LiquidityPool;
pub use provider::{DataProvider, ProviderError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Dex(#[from] DexError),

    #[error("Unknown DEX '{0}'")]
    UnknownDex(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    /// Keep the exchange-reported reserves when the data provider cannot refresh them
    pub should_fallback_to_api: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            should_fallback_to_api: true,
        }
    }
}

pub struct Aggregator {
    config: AggregatorConfig,
    policy: RequestPolicy,
    data_provider: Option<Arc<dyn DataProvider>>,
    dexs: IndexMap<String, Arc<dyn Dex>>,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig, policy: RequestPolicy) -> Self {
        Self {
            config,
            policy,
            data_provider: None,
            dexs: IndexMap::new(),
        }
    }

    /// Register the supported exchanges
    pub fn with_default_dexs(self, vyfi_api_url: Url) -> Result<Self, ProviderError> {
        let vyfinance = VyFinance::new(vyfi_api_url, self.policy.clone())?;
        Ok(self.with_dex(Arc::new(vyfinance)))
    }

    pub fn with_dex(mut self, dex: Arc<dyn Dex>) -> Self {
        self.dexs.insert(dex.name().to_string(), dex);
        self
    }

    pub fn with_data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        tracing::info!("{} data provider attached", provider.name());
        self.data_provider = Some(provider);
        self
    }

    pub fn data_provider(&self) -> Option<&Arc<dyn DataProvider>> {
        self.data_provider.as_ref()
    }

    pub fn dex_by_name(&self, name: &str) -> Option<Arc<dyn Dex>> {
        self.dexs.get(name).cloned()
    }

    pub fn available_dexs(&self) -> Vec<&str> {
        self.dexs.keys().map(String::as_str).collect()
    }

    pub(crate) fn all_dexs(&self) -> Vec<Arc<dyn Dex>> {
        self.dexs.values().cloned().collect()
    }

    pub fn new_fetch_request(&self) -> FetchRequest<'_> {
        FetchRequest::new(self)
    }

    /// Latest on-chain reserves for `pool`. Without a data provider the pool
    /// is returned as listed.
    pub async fn get_liquidity_pool_state(
        &self,
        pool: &LiquidityPool,
    ) -> Result<LiquidityPool, AggregatorError> {
        let dex = self
            .dex_by_name(&pool.dex)
            .ok_or_else(|| AggregatorError::UnknownDex(pool.dex.clone()))?;
        let Some(provider) = &self.data_provider else {
            return Ok(pool.clone());
        };

        match dex.liquidity_pool_state(pool, provider.as_ref()).await {
            Ok(refreshed) => Ok(refreshed),
            Err(e) if self.config.should_fallback_to_api => {
                tracing::warn!(
                    "{} could not refresh pool {}: {} - using listed reserves",
                    provider.name(),
                    pool.address,
                    e
                );
                Ok(pool.clone())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("data_provider", &self.data_provider.as_ref().map(|p| p.name()))
            .field("dexs", &self.available_dexs())
            .finish()
    }
}
