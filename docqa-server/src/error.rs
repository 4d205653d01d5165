//! HTTP error mapping.

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docqa_rag::RagError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by request handlers.
///
/// Every variant renders as `{"status": "error", "message": ...}`. Upstream
/// and internal failures are logged in full and answered with a generic
/// message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing or invalid function key")]
    Unauthorized,

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Rag(#[from] RagError),
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::Rejected { status: rejection.status(), message: rejection.body_text() }
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Rejected { status, message } => (*status, message.clone()),
            ApiError::Rag(RagError::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApiError::Rag(RagError::EmbeddingError { .. }) => {
                (StatusCode::BAD_GATEWAY, "Embedding service request failed".to_string())
            }
            ApiError::Rag(RagError::VectorStoreError { .. }) => {
                (StatusCode::BAD_GATEWAY, "Vector store request failed".to_string())
            }
            ApiError::Rag(RagError::LlmError { .. }) => {
                (StatusCode::BAD_GATEWAY, "Language model request failed".to_string())
            }
            ApiError::Rag(RagError::ConfigError(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }

        (status, Json(json!({ "status": "error", "message": message }))).into_response()
    }
}
