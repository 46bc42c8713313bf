//! Swap estimation and pool listing for VyFinance
//!
//! Request fields are validated before the aggregator client is touched, so
//! a malformed request is answered with 400 even when no data provider is
//! configured.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use num::BigInt;
use serde::Deserialize;

use crate::aggregator::dex::vyfinance;
use crate::aggregator::{parse_asset, LiquidityPool, SwapFee, Token};
use crate::api::AppState;
use crate::sanitize::{sanitize, Value};
use crate::service::resolver;
use crate::types::{ApiError, ApiResult};

/// The one exchange this service fronts
pub const DEX_NAME: &str = vyfinance::IDENTIFIER;

fn default_decimals() -> u8 {
    6
}

/// Base-unit amount, accepted as a decimal string or a JSON integer
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl Amount {
    fn is_blank(&self) -> bool {
        matches!(self, Amount::Text(s) if s.trim().is_empty())
    }

    fn to_positive(&self) -> ApiResult<BigInt> {
        let raw = match self {
            Amount::Text(s) => s.trim().to_string(),
            Amount::Number(n) => n.to_string(),
        };
        match raw.parse::<BigInt>() {
            Ok(n) if n > BigInt::from(0) => Ok(n),
            _ => Err(ApiError::BadRequest(format!(
                "swapInAmount must be a positive integer, got '{}'",
                raw
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub swap_in_asset: Option<String>,
    pub swap_in_amount: Option<Amount>,
    pub swap_out_asset: Option<String>,
    #[serde(default = "default_decimals")]
    pub decimals_in: u8,
    #[serde(default = "default_decimals")]
    pub decimals_out: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub swap_in_asset: Option<String>,
    pub swap_in_amount: Option<Amount>,
    pub swap_out_asset: Option<String>,
    pub wallet_address: Option<String>,
    pub slippage_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolsQuery {
    pub asset_a: Option<String>,
    pub asset_b: Option<String>,
    #[serde(default = "default_decimals")]
    pub decimals_a: u8,
    #[serde(default = "default_decimals")]
    pub decimals_b: u8,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn required_amount(value: &Option<Amount>) -> Option<&Amount> {
    value.as_ref().filter(|a| !a.is_blank())
}

fn success(data: Value) -> Json<Value> {
    Json(sanitize(Value::object([
        ("success", Value::from(true)),
        ("data", data),
    ])))
}

fn pool_side(token: &Token) -> Value {
    match token {
        Token::Lovelace => Value::from("ADA"),
        Token::Asset(_) => Value::from(token.identifier()),
    }
}

fn pool_summary(pool: &LiquidityPool) -> Value {
    Value::object([
        ("address", Value::from(pool.address.as_str())),
        ("dex", Value::from(pool.dex.as_str())),
        ("assetA", pool_side(&pool.asset_a)),
        ("assetB", pool_side(&pool.asset_b)),
    ])
}

fn pool_listing(pool: &LiquidityPool) -> Value {
    let side = |token: &Token| {
        Value::object([
            ("identifier", Value::from(token.identifier())),
            ("name", Value::from(token.display_name())),
        ])
    };
    Value::object([
        ("address", Value::from(pool.address.as_str())),
        ("dex", Value::from(pool.dex.as_str())),
        ("assetA", side(&pool.asset_a)),
        ("assetB", side(&pool.asset_b)),
    ])
}

fn fee_value(fee: &SwapFee) -> Value {
    Value::object([
        ("id", Value::from(fee.id.as_str())),
        ("title", Value::from(fee.title.as_str())),
        ("description", Value::from(fee.description.as_str())),
        ("value", Value::from(fee.value.clone())),
        ("isReturned", Value::from(fee.is_returned)),
    ])
}

/// POST /api/swap/estimate - Estimated output, price impact and unit price
pub async fn estimate_swap(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (Some(swap_in_asset), Some(swap_in_amount), Some(swap_out_asset)) = (
        required(&request.swap_in_asset),
        required_amount(&request.swap_in_amount),
        required(&request.swap_out_asset),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: swapInAsset, swapInAmount, swapOutAsset".into(),
        ));
    };

    let amount_in = swap_in_amount.to_positive()?;
    let token_in = parse_asset(swap_in_asset, request.decimals_in)?;
    let token_out = parse_asset(swap_out_asset, request.decimals_out)?;

    let aggregator = state.client.get().await?;
    let pool = resolver::find_pool(&aggregator, &token_in, &token_out, DEX_NAME)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No {} pool found for {} / {}",
                DEX_NAME, swap_in_asset, swap_out_asset
            ))
        })?;

    let dex = aggregator
        .dex_by_name(DEX_NAME)
        .ok_or_else(|| ApiError::Internal(format!("{} DEX not available", DEX_NAME)))?;

    let estimated_receive = dex.estimated_receive(&pool, &token_in, &amount_in)?;
    let price_impact = dex.price_impact_percent(&pool, &token_in, &amount_in)?;
    let one_unit = num::pow(BigInt::from(10), usize::from(request.decimals_in));
    let price_per_unit = dex.estimated_receive(&pool, &token_in, &one_unit)?;

    tracing::debug!(
        "Estimate {} {} -> {} {} via {} (impact {:.4}%)",
        amount_in,
        token_in,
        estimated_receive,
        token_out,
        pool.address,
        price_impact
    );

    Ok(success(Value::object([
        ("pool", pool_summary(&pool)),
        (
            "swap",
            Value::object([
                ("swapInAsset", Value::from(swap_in_asset)),
                ("swapInAmount", Value::from(amount_in)),
                ("swapOutAsset", Value::from(swap_out_asset)),
                ("estimatedReceive", Value::from(estimated_receive)),
                ("priceImpactPercent", Value::from(price_impact)),
                ("pricePerUnit", Value::from(price_per_unit)),
            ]),
        ),
    ])))
}

/// POST /api/swap/build - Transaction building needs a connected wallet
pub async fn build_swap(
    payload: Result<Json<BuildRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if required(&request.swap_in_asset).is_none()
        || required_amount(&request.swap_in_amount).is_none()
        || required(&request.swap_out_asset).is_none()
        || required(&request.wallet_address).is_none()
    {
        return Err(ApiError::BadRequest(
            "Missing required fields: swapInAsset, swapInAmount, swapOutAsset, walletAddress"
                .into(),
        ));
    }

    tracing::debug!(
        "Build requested with slippage {}%",
        request.slippage_percent.unwrap_or(1.0)
    );

    Err(ApiError::NotImplemented {
        message: "Building swap transactions requires wallet provider integration. \
                  This would need CIP-30 wallet connection in a frontend application. \
                  For now, use the /estimate endpoint to calculate swap details."
            .into(),
        suggestion: "To build transactions: 1) Use estimate endpoint, 2) Connect wallet via CIP-30, \
                     3) Sign and submit the swap order from the wallet"
            .into(),
    })
}

/// GET /api/swap/pools - VyFinance pools, optionally for one asset pair
pub async fn list_pools(
    State(state): State<AppState>,
    query: Result<Query<PoolsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let pair = match (required(&query.asset_a), required(&query.asset_b)) {
        (Some(a), Some(b)) => Some((
            parse_asset(a, query.decimals_a)?,
            parse_asset(b, query.decimals_b)?,
        )),
        _ => None,
    };

    let aggregator = state.client.get().await?;
    let pools = match &pair {
        Some((a, b)) => resolver::list_pools_for_pair(&aggregator, a, b, DEX_NAME).await?,
        None => resolver::list_pools(&aggregator, Some(DEX_NAME)).await?,
    };

    Ok(success(Value::object([
        ("count", Value::from(pools.len())),
        ("pools", Value::Array(pools.iter().map(pool_listing).collect())),
    ])))
}

/// GET /api/swap/info - Exchange name, order fees and active data provider
pub async fn get_info(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let aggregator = state.client.get().await?;
    let dex = aggregator
        .dex_by_name(DEX_NAME)
        .ok_or_else(|| ApiError::Internal(format!("{} DEX not available", DEX_NAME)))?;

    Ok(success(Value::object([
        ("dex", Value::from(DEX_NAME)),
        (
            "swapFees",
            Value::Array(dex.swap_order_fees().iter().map(fee_value).collect()),
        ),
        (
            "dataProvider",
            Value::from(aggregator.data_provider().map(|p| p.name())),
        ),
    ])))
}
