//! VyFinance swap backend
//!
//! HTTP facade over a small Cardano DEX aggregation client. Swaps are priced
//! against VyFinance pools whose reserves come from a Kupo or Blockfrost
//! data provider.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod sanitize;
pub mod service;
pub mod types;
