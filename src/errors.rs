//! HTTP-facing error type
//!
//! Every handler returns `Result<_, AppError>`; store failures are folded into
//! one of four client-visible categories here. Internal details are logged,
//! never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required input was missing or empty
    #[error("Bad Request - {0}")]
    InvalidInput(String),

    /// The request body could not be parsed
    #[error("Bad Request - {0}")]
    Malformed(String),

    #[error("Not Found - {0}")]
    NotFound(String),

    /// Store, timeout or decode failure; the payload is for logs only
    #[error("Internal Server Error")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::Malformed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Malformed(_) => "malformed",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("User not found".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Internal(detail) => tracing::error!(kind = self.kind(), "{}", detail),
            _ => tracing::warn!(kind = self.kind(), "{}", self),
        }

        let body = json!({
            "error": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}
