//! Health check and unknown-route handling.

use axum::extract::{OriginalUri, State};
use axum::{http::Method, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::api::AppState;
use crate::types::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// RFC 3339, UTC
    pub timestamp: String,
    /// Seconds since startup
    pub uptime: f64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// Any route not matched above
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound {
        message: format!("Route {} {} not found", method, uri),
    }
}
