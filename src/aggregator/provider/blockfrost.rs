//! Blockfrost chain API provider

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{parse_quantity, AssetBalance, DataProvider, ProviderError, Utxo};
use crate::aggregator::http::{json_body, send_with_retries, RequestPolicy};

const SOURCE: &str = "Blockfrost";
/// Blockfrost's maximum page size
const PAGE_SIZE: usize = 100;
/// Upper bound on pages fetched for a single address
const MAX_PAGES: u32 = 50;

#[derive(Debug, Deserialize)]
struct BlockfrostUtxo {
    tx_hash: String,
    output_index: u32,
    address: String,
    amount: Vec<BlockfrostAmount>,
    #[serde(default)]
    data_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlockfrostAmount {
    unit: String,
    quantity: String,
}

impl BlockfrostUtxo {
    fn into_utxo(self) -> Result<Utxo, ProviderError> {
        let amount = self
            .amount
            .into_iter()
            .map(|a| {
                Ok(AssetBalance {
                    quantity: parse_quantity(SOURCE, &a.quantity)?,
                    unit: a.unit,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        Ok(Utxo {
            tx_hash: self.tx_hash,
            output_index: self.output_index,
            address: self.address,
            amount,
            datum_hash: self.data_hash,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BlockfrostProvider {
    client: Client,
    url: Url,
    project_id: String,
    policy: RequestPolicy,
}

impl BlockfrostProvider {
    pub fn new(url: Url, project_id: &str, policy: RequestPolicy) -> Result<Self, ProviderError> {
        Ok(Self {
            client: policy.build_client(SOURCE)?,
            url,
            project_id: project_id.to_string(),
            policy,
        })
    }

    async fn paginated(&self, path: &str) -> Result<Vec<Utxo>, ProviderError> {
        let url = format!("{}{}", self.url.as_str().trim_end_matches('/'), path);
        let mut utxos = Vec::new();
        let mut complete = false;

        for page in 1..=MAX_PAGES {
            let response = send_with_retries(SOURCE, &url, &self.policy, || {
                self.client
                    .get(&url)
                    .header("project_id", &self.project_id)
                    .query(&[("page", page.to_string()), ("count", PAGE_SIZE.to_string())])
            })
            .await?;

            // Blockfrost answers 404 for addresses it has never seen
            if response.status() == StatusCode::NOT_FOUND {
                complete = true;
                break;
            }

            let batch: Vec<BlockfrostUtxo> = json_body(SOURCE, &url, response).await?;
            let last_page = batch.len() < PAGE_SIZE;
            for item in batch {
                utxos.push(item.into_utxo()?);
            }
            if last_page {
                complete = true;
                break;
            }
        }

        if !complete {
            tracing::warn!(
                "Blockfrost page limit reached for {}, keeping the first {} utxos",
                path,
                utxos.len()
            );
        }

        tracing::debug!("Blockfrost returned {} utxos for {}", utxos.len(), path);
        Ok(utxos)
    }
}

#[async_trait]
impl DataProvider for BlockfrostProvider {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, ProviderError> {
        self.paginated(&format!("/addresses/{address}/utxos")).await
    }

    async fn utxos_with_asset(
        &self,
        address: &str,
        unit: &str,
    ) -> Result<Vec<Utxo>, ProviderError> {
        self.paginated(&format!("/addresses/{address}/utxos/{unit}")).await
    }
}
