//! Pool lookup for an asset pair on one exchange

use crate::aggregator::{Aggregator, AggregatorError, LiquidityPool, Token};

/// Pool for the unordered pair `a`/`b` on `dex`.
///
/// The first pool in upstream order is used; candidates are not ranked.
/// An empty result is `Ok(None)`, a failed query is `Err`.
pub async fn find_pool(
    aggregator: &Aggregator,
    a: &Token,
    b: &Token,
    dex: &str,
) -> Result<Option<LiquidityPool>, AggregatorError> {
    let pools = list_pools_for_pair(aggregator, a, b, dex).await?;
    if pools.len() > 1 {
        tracing::debug!(
            "{} pools found for {} / {} on {}, using {}",
            pools.len(),
            a,
            b,
            dex,
            pools[0].address
        );
    }
    Ok(pools.into_iter().next())
}

pub async fn list_pools_for_pair(
    aggregator: &Aggregator,
    a: &Token,
    b: &Token,
    dex: &str,
) -> Result<Vec<LiquidityPool>, AggregatorError> {
    aggregator
        .new_fetch_request()
        .on_dexs(&[dex])?
        .for_token_pairs(vec![(a.clone(), b.clone())])
        .get_liquidity_pools()
        .await
}

/// Every pool of `dex`, or of all registered exchanges
pub async fn list_pools(
    aggregator: &Aggregator,
    dex: Option<&str>,
) -> Result<Vec<LiquidityPool>, AggregatorError> {
    let request = match dex {
        Some(name) => aggregator.new_fetch_request().on_dexs(&[name])?,
        None => aggregator.new_fetch_request().on_all_dexs(),
    };
    request.get_liquidity_pools().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::asset::Asset;
    use crate::aggregator::dex::{Dex, DexError, SwapFee};
    use crate::aggregator::provider::ProviderError;
    use crate::aggregator::{AggregatorConfig, RequestPolicy};
    use async_trait::async_trait;
    use num::BigInt;
    use std::sync::Arc;

    struct ListedDex(Result<Vec<LiquidityPool>, ProviderError>);

    #[async_trait]
    impl Dex for ListedDex {
        fn name(&self) -> &str {
            "VyFinance"
        }

        async fn liquidity_pools(&self) -> Result<Vec<LiquidityPool>, ProviderError> {
            self.0.clone()
        }

        fn estimated_receive(
            &self,
            _pool: &LiquidityPool,
            _token_in: &Token,
            _amount_in: &BigInt,
        ) -> Result<BigInt, DexError> {
            Err(DexError::NonPositiveAmount)
        }

        fn price_impact_percent(
            &self,
            _pool: &LiquidityPool,
            _token_in: &Token,
            _amount_in: &BigInt,
        ) -> Result<f64, DexError> {
            Err(DexError::NonPositiveAmount)
        }

        fn swap_order_fees(&self) -> Vec<SwapFee> {
            Vec::new()
        }
    }

    fn vyfi() -> Token {
        Token::Asset(Asset::new(&"80".repeat(28), "56594649", 6).unwrap())
    }

    fn pool(address: &str) -> LiquidityPool {
        LiquidityPool::new(
            "VyFinance",
            address,
            Token::Lovelace,
            vyfi(),
            BigInt::from(1_000_000_000u64),
            BigInt::from(2_000_000_000u64),
        )
    }

    fn aggregator(listed: Result<Vec<LiquidityPool>, ProviderError>) -> Aggregator {
        Aggregator::new(AggregatorConfig::default(), RequestPolicy::default())
            .with_dex(Arc::new(ListedDex(listed)))
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let aggregator = aggregator(Ok(vec![pool("addr_first"), pool("addr_second")]));
        let found = find_pool(&aggregator, &vyfi(), &Token::Lovelace, "VyFinance")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.address, "addr_first");
    }

    #[tokio::test]
    async fn test_empty_is_not_found() {
        let aggregator = aggregator(Ok(Vec::new()));
        let found = find_pool(&aggregator, &Token::Lovelace, &vyfi(), "VyFinance")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_query_failure_is_an_error() {
        let aggregator = aggregator(Err(ProviderError::Http {
            source_name: "VyFinance",
            url: "https://api.vyfi.io/lp".into(),
            message: "connection reset".into(),
        }));
        let err = find_pool(&aggregator, &Token::Lovelace, &vyfi(), "VyFinance")
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::Provider(ProviderError::Http { .. })));
    }

    #[tokio::test]
    async fn test_list_pools() {
        let aggregator = aggregator(Ok(vec![pool("addr1"), pool("addr2")]));
        assert_eq!(list_pools(&aggregator, Some("VyFinance")).await.unwrap().len(), 2);
        assert_eq!(list_pools(&aggregator, None).await.unwrap().len(), 2);
        assert_eq!(
            list_pools(&aggregator, Some("Minswap")).await.unwrap_err(),
            AggregatorError::UnknownDex("Minswap".into())
        );
    }
}
