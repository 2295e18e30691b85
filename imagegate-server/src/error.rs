//! Error types for the imagegate server.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use imagegate_core::QueueError;
use serde_json::json;

use crate::provider::ProviderError;

/// Seconds a rejected client is asked to wait before retrying
pub const RETRY_AFTER_SECS: u64 = 5;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The admission queue refused or dropped the request
    #[error("{0}")]
    Busy(#[from] QueueError),

    /// The image provider failed while processing the request
    #[error("Image generation failed: {0}")]
    Upstream(#[from] ProviderError),

    /// Request validation error
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong admin credentials
    #[error("Unauthorized")]
    Unauthorized,
}

impl ServerError {
    /// Create a validation error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Busy(_) => "busy",
            ServerError::Upstream(_) => "generation_failed",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Unauthorized => "unauthorized",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind(),
            }
        }));

        match self {
            ServerError::Busy(_) => {
                (status, [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_service_unavailable() {
        let err = ServerError::from(QueueError::capacity(2, 1));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("try again"));

        let response = err.into_response();
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "5");
    }

    #[test]
    fn test_upstream_reads_as_generation_failure() {
        let err = ServerError::from(ProviderError::PredictionFailed("NSFW content".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().starts_with("Image generation failed"));
        assert_eq!(err.kind(), "generation_failed");
    }

    #[test]
    fn test_variant_status_and_kind() {
        let errors = [
            ServerError::from(QueueError::Shutdown),
            ServerError::from(ProviderError::Connection("refused".to_string())),
            ServerError::invalid("prompt is required"),
            ServerError::Unauthorized,
        ];
        let kinds: Vec<_> = errors.iter().map(ServerError::kind).collect();
        assert_eq!(kinds, ["busy", "generation_failed", "invalid_request", "unauthorized"]);
        let statuses: Vec<_> = errors.iter().map(ServerError::status_code).collect();
        assert_eq!(
            statuses,
            [
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::BAD_GATEWAY,
                StatusCode::BAD_REQUEST,
                StatusCode::UNAUTHORIZED,
            ]
        );
    }

    #[test]
    fn test_unauthorized_reveals_nothing() {
        let err = ServerError::Unauthorized;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Unauthorized");
    }
}
