use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

/// Contract violations detected at the grading boundary.
///
/// Matching itself never fails; these errors mean the caller handed us
/// something outside the enumerated shapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradingError {
    #[error("Unknown question type: {0}")]
    InvalidQuestionType(String),

    #[error("Invalid grading request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<GradingError> for ApiError {
    fn from(err: GradingError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::from(GradingError::InvalidRequest(err.to_string()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        let json_response = serde_json::json!({
            "message": message,
            "status": status.as_u16()
        });
        (status, Json(json_response)).into_response()
    }
}
