//! Custom info endpoint

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::user::{CustomInfo, MessageResponse};
use crate::services::{metrics, store};
use crate::AppState;

/// POST /api/customInfo - Save a user's email and custom image
pub async fn post_custom_info(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let info: CustomInfo = serde_json::from_slice(&body)
        .map_err(|e| AppError::Malformed(format!("Error decoding request body: {}", e)))?;

    if info.user_name.is_empty() {
        return Err(AppError::InvalidInput("userName is required".to_string()));
    }

    let saved = store::bounded(
        "save_custom_info",
        state.config.store_timeout(),
        state.store.save_custom_info(&info),
    )
    .await
    .map_err(|e| {
        metrics::record_request("custom_info", "error");
        AppError::from(e)
    })?;

    metrics::record_request("custom_info", "ok");
    tracing::info!(user_name = %saved.user_name, "Custom info saved");

    Ok(Json(MessageResponse::new("Custom info saved")))
}
