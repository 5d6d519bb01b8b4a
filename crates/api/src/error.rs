//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Submission could not be parsed or failed validation
    #[error("{0}")]
    InvalidInput(String),

    /// Fields were not recognised and the miss policy is `reject`
    #[error("These fields could not be used: {}", .0.join(", "))]
    IncompleteSubmission(Vec<&'static str>),

    #[error("Malformed request body: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::IncompleteSubmission(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::NonScalarValue(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::InvalidInput(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::IncompleteSubmission(vec!["sex"]).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(InferenceError::InferenceFailed("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_feature_error_mapping() {
        let err = ApiError::from(FeatureError::InvalidNumber {
            field: "age",
            value: "old".into(),
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("age"));

        let err = ApiError::from(FeatureError::NonScalarValue("bmi".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_incomplete_message() {
        let err = ApiError::IncompleteSubmission(vec!["sex", "region"]);
        assert_eq!(err.to_string(), "These fields could not be used: sex, region");
    }
}
