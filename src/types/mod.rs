//! Shared types and error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::aggregator::{AggregatorError, AssetError, DexError};
use crate::service::ConfigError;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// No pool resolves for the requested pair
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    RouteNotFound { message: String },

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),

    #[error("{message}")]
    NotImplemented { message: String, suggestion: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Configuration(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Stable `error` field of the response body
    pub fn label(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::NotFound(_) => "Pool Not Found",
            ApiError::RouteNotFound { .. } => "Not Found",
            ApiError::Configuration(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                "Internal Server Error"
            }
            ApiError::NotImplemented { .. } => "Not Implemented",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(e: &ApiError) -> Self {
        let suggestion = match e {
            ApiError::NotImplemented { suggestion, .. } => Some(suggestion.clone()),
            _ => None,
        };
        Self {
            error: e.label().to_string(),
            message: e.to_string(),
            suggestion,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!("{}: {}", self.label(), self);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<AssetError> for ApiError {
    fn from(e: AssetError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<DexError> for ApiError {
    fn from(e: DexError) -> Self {
        match e {
            DexError::NonPositiveAmount => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AggregatorError> for ApiError {
    fn from(e: AggregatorError) -> Self {
        match e {
            AggregatorError::Provider(inner) => ApiError::Upstream(inner.to_string()),
            AggregatorError::Dex(inner) => inner.into(),
            AggregatorError::UnknownDex(_) => ApiError::Internal(e.to_string()),
        }
    }
}
