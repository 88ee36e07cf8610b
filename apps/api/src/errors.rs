use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::analyzer::AnalysisError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{ "success": false, "error": <message> }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No resume text provided")]
    EmptyInput,

    #[error("{0}")]
    BadRequest(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    AnalysisUnavailable(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::EmptyInput => AppError::EmptyInput,
            unavailable @ AnalysisError::Unavailable(_) => {
                AppError::AnalysisUnavailable(unavailable.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::EmptyInput | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            AppError::AnalysisUnavailable(msg) => {
                tracing::error!("Analysis error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Timeout(_) => {
                tracing::error!("{self}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_empty_input_is_400() {
        let (status, body) = render(AppError::from(AnalysisError::EmptyInput)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No resume text provided");
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_405() {
        let (status, body) = render(AppError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_unavailable_is_500_with_cause() {
        let err = AnalysisError::Unavailable("Model service is overloaded after 5 attempts".into());
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "Analysis unavailable: Model service is overloaded after 5 attempts"
        );
    }

    #[tokio::test]
    async fn test_timeout_is_500() {
        let (status, body) = render(AppError::Timeout(120)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Analysis timed out after 120s");
    }
}
