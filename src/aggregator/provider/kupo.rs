//! Kupo UTxO indexer provider

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{parse_quantity, AssetBalance, DataProvider, ProviderError, Utxo};
use crate::aggregator::asset::LOVELACE;
use crate::aggregator::http::{json_body, send_with_retries, RequestPolicy};

const SOURCE: &str = "Kupo";
const POLICY_ID_HEX_LEN: usize = 56;

#[derive(Debug, Deserialize)]
struct KupoMatch {
    transaction_id: String,
    output_index: u32,
    address: String,
    value: KupoValue,
    #[serde(default)]
    datum_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KupoValue {
    coins: serde_json::Number,
    #[serde(default)]
    assets: HashMap<String, serde_json::Number>,
}

impl KupoMatch {
    fn into_utxo(self) -> Result<Utxo, ProviderError> {
        let mut amount = vec![AssetBalance {
            unit: LOVELACE.to_string(),
            quantity: parse_quantity(SOURCE, &self.value.coins.to_string())?,
        }];

        for (key, quantity) in self.value.assets {
            // Kupo keys are `policy.name`, or just `policy` for an empty name
            let unit = key.replacen('.', "", 1);
            amount.push(AssetBalance {
                unit,
                quantity: parse_quantity(SOURCE, &quantity.to_string())?,
            });
        }

        Ok(Utxo {
            tx_hash: self.transaction_id,
            output_index: self.output_index,
            address: self.address,
            amount,
            datum_hash: self.datum_hash,
        })
    }
}

#[derive(Debug, Clone)]
pub struct KupoProvider {
    client: Client,
    url: Url,
    policy: RequestPolicy,
}

impl KupoProvider {
    pub fn new(url: Url, policy: RequestPolicy) -> Result<Self, ProviderError> {
        Ok(Self {
            client: policy.build_client(SOURCE)?,
            url,
            policy,
        })
    }

    fn matches_url(&self, address: &str) -> String {
        format!("{}/matches/{}", self.url.as_str().trim_end_matches('/'), address)
    }

    async fn fetch(
        &self,
        address: &str,
        filter: &[(&str, &str)],
    ) -> Result<Vec<Utxo>, ProviderError> {
        let url = self.matches_url(address);
        let response = send_with_retries(SOURCE, &url, &self.policy, || {
            // `unspent` is a bare flag in Kupo's query syntax
            self.client.get(format!("{url}?unspent")).query(filter)
        })
        .await?;

        let matches: Vec<KupoMatch> = json_body(SOURCE, &url, response).await?;
        tracing::debug!("Kupo returned {} matches for {}", matches.len(), address);

        matches.into_iter().map(KupoMatch::into_utxo).collect()
    }
}

#[async_trait]
impl DataProvider for KupoProvider {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, ProviderError> {
        self.fetch(address, &[]).await
    }

    async fn utxos_with_asset(
        &self,
        address: &str,
        unit: &str,
    ) -> Result<Vec<Utxo>, ProviderError> {
        if unit == LOVELACE || unit.len() < POLICY_ID_HEX_LEN {
            return self.utxos(address).await;
        }

        let (policy_id, asset_name) = unit.split_at(POLICY_ID_HEX_LEN);
        if asset_name.is_empty() {
            self.fetch(address, &[("policy_id", policy_id)]).await
        } else {
            self.fetch(address, &[("policy_id", policy_id), ("asset_name", asset_name)])
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use num::BigInt;
    use std::time::Duration;

    const MATCHES: &str = r#"[
        {
            "transaction_index": 3,
            "transaction_id": "5f2d0c8e9a2b4c1d",
            "output_index": 1,
            "address": "addr1pool",
            "value": {
                "coins": 1500000000,
                "assets": {
                    "804f5544c1962a40546827cab750a88404dc7108c0f588b72964754f.56594649": 250000000000,
                    "aabbccddeeff00112233445566778899aabbccddeeff001122334455": 1
                }
            },
            "datum_hash": "d1",
            "created_at": { "slot_no": 1, "header_hash": "h" },
            "spent_at": null
        }
    ]"#;

    fn provider(server: &Server) -> KupoProvider {
        let policy =
            RequestPolicy::new(Duration::from_secs(2), 0).with_backoff(Duration::from_millis(1));
        KupoProvider::new(Url::parse(&server.url()).unwrap(), policy).unwrap()
    }

    #[tokio::test]
    async fn test_decodes_matches() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/matches/addr1pool")
            .match_query(Matcher::Regex("unspent".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(MATCHES)
            .create_async()
            .await;

        let utxos = provider(&server).utxos("addr1pool").await.unwrap();

        mock.assert_async().await;
        assert_eq!(utxos.len(), 1);
        let utxo = &utxos[0];
        assert_eq!(utxo.tx_hash, "5f2d0c8e9a2b4c1d");
        assert_eq!(utxo.quantity_of("lovelace"), BigInt::from(1_500_000_000u64));
        assert_eq!(
            utxo.quantity_of("804f5544c1962a40546827cab750a88404dc7108c0f588b72964754f56594649"),
            BigInt::from(250_000_000_000u64)
        );
        assert!(utxo.holds("aabbccddeeff00112233445566778899aabbccddeeff001122334455"));
    }

    #[tokio::test]
    async fn test_asset_filter_is_sent_as_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/matches/addr1pool")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "policy_id".into(),
                    "804f5544c1962a40546827cab750a88404dc7108c0f588b72964754f".into(),
                ),
                Matcher::UrlEncoded("asset_name".into(), "56594649".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let utxos = provider(&server)
            .utxos_with_asset(
                "addr1pool",
                "804f5544c1962a40546827cab750a88404dc7108c0f588b72964754f56594649",
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(utxos.is_empty());
    }
}
