//! VyFinance Swap Backend
//!
//! HTTP API server estimating VyFinance swaps on Cardano mainnet.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vyfinance_swap_backend::api;
use vyfinance_swap_backend::config::Settings;
use vyfinance_swap_backend::service::ClientCell;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables (RUST_LOG included) before anything reads them
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = Settings::parse();

    // Provider settings are checked on the first pool-dependent request
    let client = Arc::new(ClientCell::from_settings(settings.provider_settings()));
    let app = api::app(client);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", settings.host, settings.port))?;
    tracing::info!("Starting server on {}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health            - Health check");
    tracing::info!("  POST /api/swap/estimate - Estimate swap output and price impact");
    tracing::info!("  POST /api/swap/build    - Build swap transaction (not implemented)");
    tracing::info!("  GET  /api/swap/pools    - List VyFinance pools (?assetA&assetB)");
    tracing::info!("  GET  /api/swap/info     - DEX fees and data provider");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
