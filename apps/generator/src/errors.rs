use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::request::RequestError;
use crate::planning::planner::PlanError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request, non-positive ratio total, missing credentials. Fatal for the run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Well-formed request with an unusable value, e.g. an unknown word level.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Lookup error: {0}")]
    Lookup(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RequestError> for AppError {
    fn from(e: RequestError) -> Self {
        AppError::Configuration(e.to_string())
    }
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        AppError::Configuration(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Configuration(msg) => (
                StatusCode::BAD_REQUEST,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Lookup(e) => {
                tracing::error!("Lookup error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOOKUP_ERROR",
                    "A curriculum lookup failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_maps_to_configuration() {
        let err: AppError = RequestError::NoCategories.into();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_plan_error_maps_to_configuration() {
        let err: AppError = PlanError::NonPositiveTotalRatio(0.0).into();
        assert!(err.to_string().contains("non-positive"));
    }

    #[test]
    fn test_lookup_error_hides_details() {
        let err = AppError::Lookup(sqlx::Error::RowNotFound);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
