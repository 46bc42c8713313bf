//! Data provider selection
//!
//! Exactly one provider backs the aggregator. Kupo wins whenever it is
//! configured; Blockfrost needs both its URL and project id.

use std::sync::Arc;

use url::Url;

use crate::aggregator::dex::vyfinance::DEFAULT_API_URL;
use crate::aggregator::provider::{BlockfrostProvider, DataProvider, KupoProvider};
use crate::aggregator::{Aggregator, AggregatorConfig, RequestPolicy};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("No data provider configured. Set KUPO_URL or BLOCKFROST credentials in .env")]
    NoDataProviderConfigured,

    #[error("Invalid {name} '{value}': {reason}")]
    InvalidProviderUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to initialize {0}")]
    ClientInit(String),
}

/// Provider-related settings as read from the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSettings {
    pub kupo_url: Option<String>,
    pub blockfrost_url: Option<String>,
    pub blockfrost_project_id: Option<String>,
    pub vyfi_api_url: Option<String>,
    pub policy: RequestPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderBinding {
    Kupo { url: Url },
    Blockfrost { url: Url, project_id: String },
}

impl ProviderBinding {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderBinding::Kupo { .. } => "Kupo",
            ProviderBinding::Blockfrost { .. } => "Blockfrost",
        }
    }

    pub fn connect(&self, policy: &RequestPolicy) -> Result<Arc<dyn DataProvider>, ConfigError> {
        let provider: Arc<dyn DataProvider> = match self {
            ProviderBinding::Kupo { url } => Arc::new(
                KupoProvider::new(url.clone(), policy.clone())
                    .map_err(|e| ConfigError::ClientInit(e.to_string()))?,
            ),
            ProviderBinding::Blockfrost { url, project_id } => Arc::new(
                BlockfrostProvider::new(url.clone(), project_id, policy.clone())
                    .map_err(|e| ConfigError::ClientInit(e.to_string()))?,
            ),
        };
        Ok(provider)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidProviderUrl {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Kupo, else Blockfrost (URL and project id), else nothing usable
pub fn select_binding(settings: &ProviderSettings) -> Result<ProviderBinding, ConfigError> {
    if let Some(url) = present(&settings.kupo_url) {
        return Ok(ProviderBinding::Kupo {
            url: parse_url("KUPO_URL", url)?,
        });
    }

    match (
        present(&settings.blockfrost_url),
        present(&settings.blockfrost_project_id),
    ) {
        (Some(url), Some(project_id)) => Ok(ProviderBinding::Blockfrost {
            url: parse_url("BLOCKFROST_URL", url)?,
            project_id: project_id.to_string(),
        }),
        _ => Err(ConfigError::NoDataProviderConfigured),
    }
}

/// Build an aggregator with the default exchanges and the selected provider
pub fn configure_aggregator(settings: &ProviderSettings) -> Result<Aggregator, ConfigError> {
    let binding = select_binding(settings)?;
    tracing::info!("Configuring {} provider...", binding.name());

    let api_url = parse_url(
        "VYFI_API_URL",
        present(&settings.vyfi_api_url).unwrap_or(DEFAULT_API_URL),
    )?;
    let provider = binding.connect(&settings.policy)?;

    let aggregator = Aggregator::new(AggregatorConfig::default(), settings.policy.clone())
        .with_default_dexs(api_url)
        .map_err(|e| ConfigError::ClientInit(e.to_string()))?
        .with_data_provider(provider);

    Ok(aggregator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BLOCKFROST_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0";

    fn settings(
        kupo: Option<&str>,
        bf_url: Option<&str>,
        bf_project: Option<&str>,
    ) -> ProviderSettings {
        ProviderSettings {
            kupo_url: kupo.map(String::from),
            blockfrost_url: bf_url.map(String::from),
            blockfrost_project_id: bf_project.map(String::from),
            ..ProviderSettings::default()
        }
    }

    #[rstest]
    #[case::kupo_only(Some("http://kupo:1442"), None, None, "Kupo")]
    #[case::kupo_wins_over_blockfrost(
        Some("http://kupo:1442"),
        Some(BLOCKFROST_URL),
        Some("mainnetabc"),
        "Kupo"
    )]
    #[case::blockfrost(
        None,
        Some(BLOCKFROST_URL),
        Some("mainnetabc"),
        "Blockfrost"
    )]
    #[case::blank_kupo_falls_through(
        Some("  "),
        Some(BLOCKFROST_URL),
        Some("mainnetabc"),
        "Blockfrost"
    )]
    fn test_precedence(
        #[case] kupo: Option<&str>,
        #[case] bf_url: Option<&str>,
        #[case] bf_project: Option<&str>,
        #[case] expected: &str,
    ) {
        let binding = select_binding(&settings(kupo, bf_url, bf_project)).unwrap();
        assert_eq!(binding.name(), expected);
    }

    #[rstest]
    #[case::nothing(None, None, None)]
    #[case::blockfrost_without_project(None, Some(BLOCKFROST_URL), None)]
    #[case::project_without_url(None, None, Some("mainnetabc"))]
    fn test_no_usable_provider(
        #[case] kupo: Option<&str>,
        #[case] bf_url: Option<&str>,
        #[case] bf_project: Option<&str>,
    ) {
        assert_eq!(
            select_binding(&settings(kupo, bf_url, bf_project)),
            Err(ConfigError::NoDataProviderConfigured)
        );
    }

    #[test]
    fn test_malformed_kupo_url() {
        let err = select_binding(&settings(Some("not a url"), None, None)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProviderUrl { name: "KUPO_URL", .. }));
    }

    #[test]
    fn test_configure_attaches_selected_provider() {
        let aggregator =
            configure_aggregator(&settings(Some("http://localhost:1442"), None, None)).unwrap();
        assert_eq!(aggregator.data_provider().map(|p| p.name()), Some("Kupo"));
        assert_eq!(aggregator.available_dexs(), vec!["VyFinance"]);
    }
}
