use std::time::Duration;

use clap::Parser;

use crate::aggregator::RequestPolicy;
use crate::service::ProviderSettings;

/// VyFinance swap backend
///
/// Estimates swaps and lists liquidity pools for the VyFinance DEX on Cardano.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct Settings {
    /// The server IP
    #[clap(long, env, default_value = "0.0.0.0")]
    pub host: String,

    /// The server port
    #[clap(long, env, default_value = "3000")]
    pub port: u16,

    /// Kupo indexer URL. Takes precedence over Blockfrost
    #[clap(long, env)]
    pub kupo_url: Option<String>,

    /// Blockfrost API URL
    #[clap(long, env)]
    pub blockfrost_url: Option<String>,

    /// Blockfrost project id
    #[clap(long, env, hide_env_values = true)]
    pub blockfrost_project_id: Option<String>,

    /// VyFi pool API
    #[clap(long, env, default_value = "https://api.vyfi.io")]
    pub vyfi_api_url: String,

    /// Timeout for each upstream request, in milliseconds
    #[clap(long, env, default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Retries for transient upstream failures
    #[clap(long, env, default_value = "3")]
    pub request_retries: u32,
}

impl Settings {
    pub fn request_policy(&self) -> RequestPolicy {
        RequestPolicy::new(
            Duration::from_millis(self.request_timeout_ms),
            self.request_retries,
        )
    }

    /// Provider part of the settings. Validated when the aggregator is first needed.
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            kupo_url: self.kupo_url.clone(),
            blockfrost_url: self.blockfrost_url.clone(),
            blockfrost_project_id: self.blockfrost_project_id.clone(),
            vyfi_api_url: Some(self.vyfi_api_url.clone()),
            policy: self.request_policy(),
        }
    }
}
