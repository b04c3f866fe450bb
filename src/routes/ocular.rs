//! Image data API endpoints
//!
//! `GET /api/ocular?userName=` reads a user's records, `POST /api/ocular`
//! creates or merges them. The POST handler waits for the merge to be
//! acknowledged by the store before answering.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::AppError;
use crate::models::user::{MessageResponse, UserRecord};
use crate::services::metrics;
use crate::AppState;

/// Query params for reading image data
#[derive(Debug, Deserialize)]
pub struct OcularQuery {
    #[serde(rename = "userName", default)]
    pub user_name: String,
}

/// GET /api/ocular - Get the stored image data for a user
pub async fn get_user_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OcularQuery>,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    let started = Instant::now();

    let result = state.reader.fetch(&query.user_name).await;

    match &result {
        Ok(records) => {
            metrics::record_request("fetch", "ok");
            tracing::info!(
                user_name = %query.user_name,
                records = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Fetched data for user"
            );
        }
        Err(e) => metrics::record_request("fetch", e.kind()),
    }

    result.map(Json)
}

/// POST /api/ocular - Create or merge a user's image data
pub async fn post_user_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let started = Instant::now();

    let user: UserRecord = serde_json::from_slice(&body).map_err(|e| {
        metrics::record_request("merge", "malformed");
        AppError::Malformed(format!("Error decoding request body: {}", e))
    })?;

    let outcome = state.merger.merge(user).await?;

    tracing::info!(
        outcome = %outcome,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Post request handled"
    );

    Ok(Json(MessageResponse::new(outcome.message())))
}
