use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Failed to load recommendations: {0}")]
    RecommendationLoad(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Cache(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ExternalApi(_)
            | AppError::HttpClient(_)
            | AppError::RecommendationLoad(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::ExternalApi(msg) => {
                msg
            }
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("movie 1".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidInput("empty".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ExternalApi("503".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::RecommendationLoad("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_recommendation_load_message() {
        let err = AppError::RecommendationLoad("popular movies unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to load recommendations: popular movies unavailable"
        );
    }
}
