use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::engine::CartError;
use crate::storage::backend::StorageError;

/// Error type returned by HTTP handlers.
///
/// Business-rule rejections map to 4xx responses with a descriptive message;
/// only a storage failure that exhausted both backends surfaces as a 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(err) => {
                tracing::error!("storage failure reached the handler layer: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            // Backend details stay in the logs, not in the response body.
            ApiError::Storage(_) => "storage unavailable".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Storage(inner) => ApiError::Storage(inner),
            CartError::CartNotFound(_)
            | CartError::ProductNotFound(_)
            | CartError::ItemNotFound(_)
            | CartError::NotEligible => ApiError::NotFound(err.to_string()),
            CartError::BelowMinimum { .. }
            | CartError::AboveMaximum { .. }
            | CartError::InvalidQuantity
            | CartError::MissingIdentity => ApiError::BadRequest(err.to_string()),
        }
    }
}
