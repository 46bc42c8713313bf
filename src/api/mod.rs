//! HTTP API for the VyFinance swap service

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod swap;
pub mod system;

use crate::service::ClientCell;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ClientCell>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(client: Arc<ClientCell>) -> Self {
        Self {
            client,
            started_at: Instant::now(),
        }
    }
}

/// Create the API router with all endpoints
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/swap/estimate", post(swap::estimate_swap))
        .route("/swap/build", post(swap::build_swap))
        .route("/swap/pools", get(swap::list_pools))
        .route("/swap/info", get(swap::get_info))
        .fallback(system::not_found)
        .with_state(app_state)
}

/// Full application: health check, `/api` routes, 404 fallback, CORS and request tracing
pub fn app(client: Arc<ClientCell>) -> Router {
    let app_state = AppState::new(client);

    Router::new()
        .route("/health", get(system::health_check))
        .with_state(app_state.clone())
        .nest("/api", router(app_state))
        .fallback(system::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
