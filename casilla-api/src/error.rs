use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use casilla_consolidation::ConsolidationError;
use casilla_core::CoreError;
use casilla_gex::{QuoteError, WarrantyError};

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    RateUnavailable(String),
    PaymentFailed(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::RateUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::PaymentFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(_) | CoreError::EmptySelection => {
                AppError::ValidationError(err.to_string())
            }
            CoreError::PackageAlreadyGrouped(_)
            | CoreError::PackageNotAvailable(_)
            | CoreError::PolicyAlreadyActive(_)
            | CoreError::InvalidTransition { .. } => AppError::ConflictError(err.to_string()),
            CoreError::RateUnavailable(msg) => AppError::RateUnavailable(msg),
            CoreError::PaymentFailed(msg) => AppError::PaymentFailed(msg),
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::InternalError(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<ConsolidationError> for AppError {
    fn from(err: ConsolidationError) -> Self {
        AppError::from(CoreError::from(err))
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::RateUnavailable(msg) => AppError::RateUnavailable(msg),
            QuoteError::Pricing(e) => AppError::ValidationError(e.to_string()),
        }
    }
}

impl From<WarrantyError> for AppError {
    fn from(err: WarrantyError) -> Self {
        match err {
            WarrantyError::PolicyAlreadyActive(_) => AppError::ConflictError(err.to_string()),
            _ => AppError::ValidationError(err.to_string()),
        }
    }
}
