//! Remote chain data providers
//!
//! Both providers answer the same question (which UTxOs sit at an address,
//! optionally narrowed to those holding an asset) and differ in transport:
//! - Kupo: self-hosted UTxO indexer, fast and without credentials
//! - Blockfrost: hosted chain API, authenticated by a project id

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use num::BigInt;

mod blockfrost;
mod kupo;

pub use blockfrost::BlockfrostProvider;
pub use kupo::KupoProvider;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("{source_name} request to {url} failed: {message}")]
    Http {
        source_name: &'static str,
        url: String,
        message: String,
    },

    #[error("{source_name} returned HTTP {status} for {url}")]
    Status {
        source_name: &'static str,
        url: String,
        status: u16,
    },

    #[error("{source_name} response could not be decoded: {message}")]
    Decode {
        source_name: &'static str,
        message: String,
    },

    #[error("Failed to build {source_name} HTTP client: {message}")]
    Client {
        source_name: &'static str,
        message: String,
    },
}

/// Quantity of one unit held by a UTxO. `unit` is `lovelace` or `policy ++ name`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub unit: String,
    pub quantity: BigInt,
}

/// Unspent transaction output
#[derive(Debug, Clone, PartialEq)]
pub struct Utxo {
    pub tx_hash: String,
    pub output_index: u32,
    pub address: String,
    pub amount: Vec<AssetBalance>,
    pub datum_hash: Option<String>,
}

impl Utxo {
    pub fn quantity_of(&self, unit: &str) -> BigInt {
        self.amount
            .iter()
            .filter(|balance| balance.unit == unit)
            .map(|balance| balance.quantity.clone())
            .sum()
    }

    pub fn holds(&self, unit: &str) -> bool {
        self.amount
            .iter()
            .any(|balance| balance.unit == unit && balance.quantity > BigInt::from(0))
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Display name reported by the info endpoint
    fn name(&self) -> &'static str;

    /// All unspent outputs at `address`
    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, ProviderError>;

    /// Unspent outputs at `address` holding `unit`
    async fn utxos_with_asset(&self, address: &str, unit: &str)
        -> Result<Vec<Utxo>, ProviderError>;
}

pub(crate) fn parse_quantity(
    source_name: &'static str,
    raw: &str,
) -> Result<BigInt, ProviderError> {
    raw.parse::<BigInt>().map_err(|e| ProviderError::Decode {
        source_name,
        message: format!("invalid quantity '{raw}': {e}"),
    })
}
