//! Facade services: provider selection, the shared aggregator handle and
//! pool lookup

pub mod client;
pub mod provider;
pub mod resolver;

pub use client::ClientCell;
pub use provider::{
    configure_aggregator, select_binding, ConfigError, ProviderBinding, ProviderSettings,
};
pub use resolver::{find_pool, list_pools, list_pools_for_pair};
