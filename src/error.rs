//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"ok": false, "error": <message>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::announcements::ServiceError;
use crate::storage::StoreError;

#[derive(Debug)]
pub enum ApiError {
    /// Empty title or text (400). A client mistake, not logged as a fault.
    Validation(String),

    /// Request body over the configured limit (413).
    PayloadTooLarge(String),

    /// Storage failed while serving a request (500).
    Storage(StoreError),

    /// Backend health check failed (503).
    Unavailable(StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Validation(message) | Self::PayloadTooLarge(message) => message,
            Self::Storage(e) => {
                tracing::error!("Storage error: {e}");
                e.to_string()
            }
            Self::Unavailable(e) => {
                tracing::warn!("Health check failed: {e}");
                e.to_string()
            }
        };

        (status, Json(json!({ "ok": false, "error": message }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation => Self::Validation(e.to_string()),
            ServiceError::Store(e) => Self::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_is_400_with_fixed_message() {
        let response = ApiError::from(ServiceError::Validation).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": false, "error": "Both 'title' and 'text' are required." })
        );
    }

    #[tokio::test]
    async fn test_storage_error_surfaces_message() {
        let err = StoreError::Io(std::io::Error::other("read-only file system"));
        let response = ApiError::Storage(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("read-only file system"));
    }

    #[tokio::test]
    async fn test_payload_too_large_is_413() {
        let response = ApiError::PayloadTooLarge("Request payload is too large".into()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": false, "error": "Request payload is too large" })
        );
    }

    #[tokio::test]
    async fn test_unavailable_is_503() {
        let response = ApiError::Unavailable(StoreError::Database(sqlx::Error::PoolTimedOut))
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
