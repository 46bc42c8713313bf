//! Process-wide aggregator handle
//!
//! The aggregator is configured on first use. Whatever the first attempt
//! produces is kept for the lifetime of the process: later callers get the
//! same instance, or the same configuration error, without configuring again.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::provider::{configure_aggregator, ConfigError, ProviderSettings};
use crate::aggregator::Aggregator;

type Configure = dyn Fn() -> Result<Aggregator, ConfigError> + Send + Sync;

pub struct ClientCell {
    configure: Box<Configure>,
    state: OnceCell<Result<Arc<Aggregator>, ConfigError>>,
}

impl ClientCell {
    pub fn new<F>(configure: F) -> Self
    where
        F: Fn() -> Result<Aggregator, ConfigError> + Send + Sync + 'static,
    {
        Self {
            configure: Box::new(configure),
            state: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: ProviderSettings) -> Self {
        Self::new(move || configure_aggregator(&settings))
    }

    /// Configured aggregator, configuring it on the first call.
    ///
    /// Concurrent first callers wait on a single configuration attempt.
    pub async fn get(&self) -> Result<Arc<Aggregator>, ConfigError> {
        self.state
            .get_or_init(|| async {
                tracing::info!("Initializing aggregator client...");
                match (self.configure)() {
                    Ok(aggregator) => {
                        tracing::info!("Aggregator client initialized successfully");
                        Ok(Arc::new(aggregator))
                    }
                    Err(e) => {
                        tracing::error!("Aggregator client initialization failed: {}", e);
                        Err(e)
                    }
                }
            })
            .await
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// Active data provider, once configuration has succeeded
    pub fn provider_name(&self) -> Option<&'static str> {
        match self.state.get() {
            Some(Ok(aggregator)) => aggregator.data_provider().map(|p| p.name()),
            _ => None,
        }
    }
}

impl fmt::Debug for ClientCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCell")
            .field("state", &self.state.get())
            .finish()
    }
}
