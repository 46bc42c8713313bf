//! Liquidity pool projection

use num::BigInt;

use super::asset::{Asset, Token};

/// Reserve pair held by a DEX at an on-chain address
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityPool {
    pub dex: String,
    pub address: String,
    pub asset_a: Token,
    pub asset_b: Token,
    pub reserve_a: BigInt,
    pub reserve_b: BigInt,
    /// Total fee charged on the input side, in percent (0.3 == 0.3%)
    pub pool_fee_percent: f64,
    pub lp_token: Option<Asset>,
    pub identifier: String,
    /// NFT held by the pool UTxO, used to pick it out among others at the address
    pub nft: Option<Asset>,
}

impl LiquidityPool {
    pub fn new(
        dex: &str,
        address: &str,
        asset_a: Token,
        asset_b: Token,
        reserve_a: BigInt,
        reserve_b: BigInt,
    ) -> Self {
        Self {
            dex: dex.to_string(),
            address: address.to_string(),
            asset_a,
            asset_b,
            reserve_a,
            reserve_b,
            pool_fee_percent: 0.0,
            lp_token: None,
            identifier: String::new(),
            nft: None,
        }
    }

    pub fn contains(&self, token: &Token) -> bool {
        &self.asset_a == token || &self.asset_b == token
    }

    /// Unordered pair match
    pub fn matches_pair(&self, a: &Token, b: &Token) -> bool {
        (&self.asset_a == a && &self.asset_b == b) || (&self.asset_a == b && &self.asset_b == a)
    }

    /// Reserves ordered as (in, out) for a swap starting from `token_in`
    pub fn reserves_for(&self, token_in: &Token) -> Option<(&BigInt, &BigInt)> {
        if &self.asset_a == token_in {
            Some((&self.reserve_a, &self.reserve_b))
        } else if &self.asset_b == token_in {
            Some((&self.reserve_b, &self.reserve_a))
        } else {
            None
        }
    }

    /// Counter asset of `token_in` within this pool
    pub fn other_side(&self, token_in: &Token) -> Option<&Token> {
        if &self.asset_a == token_in {
            Some(&self.asset_b)
        } else if &self.asset_b == token_in {
            Some(&self.asset_a)
        } else {
            None
        }
    }

    pub fn pair(&self) -> String {
        format!("{}/{}", self.asset_a, self.asset_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vyfi() -> Token {
        Token::Asset(
            Asset::new(
                "804f5544c1962a40546827cab750a88404dc7108c0f588b72964754f",
                "56594649",
                6,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_pair_matching_is_unordered() {
        let pool = LiquidityPool::new(
            "VyFinance",
            "addr1pool",
            Token::Lovelace,
            vyfi(),
            BigInt::from(10),
            BigInt::from(20),
        );
        assert!(pool.matches_pair(&Token::Lovelace, &vyfi()));
        assert!(pool.matches_pair(&vyfi(), &Token::Lovelace));
        assert!(!pool.matches_pair(&Token::Lovelace, &Token::Lovelace));
    }

    #[test]
    fn test_reserves_follow_input_side() {
        let pool = LiquidityPool::new(
            "VyFinance",
            "addr1pool",
            Token::Lovelace,
            vyfi(),
            BigInt::from(10),
            BigInt::from(20),
        );
        let (rin, rout) = pool.reserves_for(&vyfi()).unwrap();
        assert_eq!(rin, &BigInt::from(20));
        assert_eq!(rout, &BigInt::from(10));
        assert_eq!(pool.other_side(&vyfi()), Some(&Token::Lovelace));
    }
}
