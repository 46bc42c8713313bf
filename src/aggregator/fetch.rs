//! Liquidity pool query builder

use std::sync::Arc;

use super::asset::Token;
use super::dex::Dex;
use super::pool::LiquidityPool;
use super::{Aggregator, AggregatorError};

/// Pools are collected per exchange, in the order the exchanges were selected.
/// When a token or pair filter is set, the matching pools are refreshed from
/// the data provider before being returned.
pub struct FetchRequest<'a> {
    aggregator: &'a Aggregator,
    dexs: Vec<Arc<dyn Dex>>,
    tokens: Vec<Token>,
    token_pairs: Vec<(Token, Token)>,
}

impl<'a> FetchRequest<'a> {
    pub(crate) fn new(aggregator: &'a Aggregator) -> Self {
        Self {
            aggregator,
            dexs: Vec::new(),
            tokens: Vec::new(),
            token_pairs: Vec::new(),
        }
    }

    pub fn on_dexs<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, AggregatorError> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let dex = self
                .aggregator
                .dex_by_name(name.as_ref())
                .ok_or_else(|| AggregatorError::UnknownDex(name.as_ref().to_string()))?;
            selected.push(dex);
        }
        self.dexs = selected;
        Ok(self)
    }

    pub fn on_all_dexs(mut self) -> Self {
        self.dexs = self.aggregator.all_dexs();
        self
    }

    /// Keep pools containing any of `tokens`
    pub fn for_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Keep pools matching any of `pairs`, in either order
    pub fn for_token_pairs(mut self, pairs: Vec<(Token, Token)>) -> Self {
        self.token_pairs = pairs;
        self
    }

    fn is_filtered(&self) -> bool {
        !self.tokens.is_empty() || !self.token_pairs.is_empty()
    }

    fn matches(&self, pool: &LiquidityPool) -> bool {
        let by_token = self.tokens.is_empty() || self.tokens.iter().any(|t| pool.contains(t));
        let by_pair = self.token_pairs.is_empty()
            || self.token_pairs.iter().any(|(a, b)| pool.matches_pair(a, b));
        by_token && by_pair
    }

    pub async fn get_liquidity_pools(self) -> Result<Vec<LiquidityPool>, AggregatorError> {
        let dexs = if self.dexs.is_empty() {
            self.aggregator.all_dexs()
        } else {
            self.dexs.clone()
        };

        let mut pools = Vec::new();
        for dex in dexs {
            let listed = dex.liquidity_pools().await?;
            let total = listed.len();
            let selected: Vec<LiquidityPool> =
                listed.into_iter().filter(|pool| self.matches(pool)).collect();
            tracing::debug!("{}: {} of {} pools selected", dex.name(), selected.len(), total);

            if self.is_filtered() {
                for pool in &selected {
                    pools.push(self.aggregator.get_liquidity_pool_state(pool).await?);
                }
            } else {
                pools.extend(selected);
            }
        }

        Ok(pools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::asset::Asset;
    use crate::aggregator::dex::{DexError, SwapFee};
    use crate::aggregator::provider::{MockDataProvider, ProviderError};
    use crate::aggregator::{AggregatorConfig, RequestPolicy};
    use async_trait::async_trait;
    use num::BigInt;

    struct StaticDex {
        name: &'static str,
        pools: Vec<LiquidityPool>,
    }

    #[async_trait]
    impl Dex for StaticDex {
        fn name(&self) -> &str {
            self.name
        }

        async fn liquidity_pools(&self) -> Result<Vec<LiquidityPool>, ProviderError> {
            Ok(self.pools.clone())
        }

        fn estimated_receive(
            &self,
            _pool: &LiquidityPool,
            _token_in: &Token,
            amount_in: &BigInt,
        ) -> Result<BigInt, DexError> {
            Ok(amount_in.clone())
        }

        fn price_impact_percent(
            &self,
            _pool: &LiquidityPool,
            _token_in: &Token,
            _amount_in: &BigInt,
        ) -> Result<f64, DexError> {
            Ok(0.0)
        }

        fn swap_order_fees(&self) -> Vec<SwapFee> {
            Vec::new()
        }
    }

    fn token(policy_byte: &str) -> Token {
        Token::Asset(Asset::new(&policy_byte.repeat(28), "", 0).unwrap())
    }

    fn pool(dex: &str, address: &str, a: Token, b: Token) -> LiquidityPool {
        let mut pool = LiquidityPool::new(dex, address, a, b, BigInt::from(1), BigInt::from(1));
        pool.nft = Some(Asset::new(&"ff".repeat(28), "", 0).unwrap());
        pool
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(AggregatorConfig::default(), RequestPolicy::default())
            .with_dex(Arc::new(StaticDex {
                name: "VyFinance",
                pools: vec![
                    pool("VyFinance", "addr1", Token::Lovelace, token("aa")),
                    pool("VyFinance", "addr2", token("bb"), Token::Lovelace),
                    pool("VyFinance", "addr3", token("aa"), token("bb")),
                ],
            }))
            .with_dex(Arc::new(StaticDex {
                name: "Other",
                pools: vec![pool("Other", "addr4", Token::Lovelace, token("aa"))],
            }))
    }

    fn addresses(pools: &[LiquidityPool]) -> Vec<&str> {
        pools.iter().map(|p| p.address.as_str()).collect()
    }

    #[tokio::test]
    async fn test_pair_filter_is_unordered_and_scoped_to_dex() {
        let aggregator = aggregator();
        let pools = aggregator
            .new_fetch_request()
            .on_dexs(&["VyFinance"])
            .unwrap()
            .for_token_pairs(vec![(token("aa"), Token::Lovelace)])
            .get_liquidity_pools()
            .await
            .unwrap();

        assert_eq!(addresses(&pools), vec!["addr1"]);
    }

    #[tokio::test]
    async fn test_all_dexs_without_filter() {
        let aggregator = aggregator();
        let pools = aggregator
            .new_fetch_request()
            .on_all_dexs()
            .get_liquidity_pools()
            .await
            .unwrap();

        assert_eq!(addresses(&pools), vec!["addr1", "addr2", "addr3", "addr4"]);
    }

    #[tokio::test]
    async fn test_token_filter() {
        let aggregator = aggregator();
        let pools = aggregator
            .new_fetch_request()
            .for_tokens(vec![token("bb")])
            .get_liquidity_pools()
            .await
            .unwrap();

        assert_eq!(addresses(&pools), vec!["addr2", "addr3"]);
    }

    #[tokio::test]
    async fn test_unknown_dex_is_rejected() {
        let aggregator = aggregator();
        let err = aggregator
            .new_fetch_request()
            .on_dexs(&["Minswap"])
            .err()
            .unwrap();
        assert_eq!(err, AggregatorError::UnknownDex("Minswap".into()));
    }

    #[tokio::test]
    async fn test_refresh_failure_falls_back_to_listed_reserves() {
        let mut provider = MockDataProvider::new();
        provider.expect_name().return_const("Kupo");
        provider
            .expect_utxos_with_asset()
            .times(1)
            .returning(|address, _| {
                Err(ProviderError::Status {
                    source_name: "Kupo",
                    url: format!("http://kupo/matches/{address}"),
                    status: 503,
                })
            });

        let aggregator = aggregator().with_data_provider(Arc::new(provider));
        let pools = aggregator
            .new_fetch_request()
            .on_dexs(&["VyFinance"])
            .unwrap()
            .for_token_pairs(vec![(Token::Lovelace, token("aa"))])
            .get_liquidity_pools()
            .await
            .unwrap();

        assert_eq!(addresses(&pools), vec!["addr1"]);
        assert_eq!(pools[0].reserve_a, BigInt::from(1));
    }

    #[tokio::test]
    async fn test_refresh_failure_without_fallback_is_an_error() {
        let mut provider = MockDataProvider::new();
        provider.expect_name().return_const("Kupo");
        provider.expect_utxos_with_asset().returning(|_, _| {
            Err(ProviderError::Http {
                source_name: "Kupo",
                url: "http://kupo".into(),
                message: "connection refused".into(),
            })
        });

        let aggregator = Aggregator::new(
            AggregatorConfig {
                should_fallback_to_api: false,
            },
            RequestPolicy::default(),
        )
        .with_dex(Arc::new(StaticDex {
            name: "VyFinance",
            pools: vec![pool("VyFinance", "addr1", Token::Lovelace, token("aa"))],
        }))
        .with_data_provider(Arc::new(provider));

        let err = aggregator
            .new_fetch_request()
            .for_tokens(vec![Token::Lovelace])
            .get_liquidity_pools()
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::Provider(ProviderError::Http { .. })));
    }
}
