//! GET /api/result/:id and GET /api/health

use super::ApiError;
use crate::models::AnalysisRecord;
use crate::server::ServerAppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

pub const RESULT_NOT_FOUND: &str = "Result not found or expired";

/// Fetch a stored analysis by id
pub async fn result_handler(
    State(state): State<ServerAppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisRecord>, ApiError> {
    match state.store.get(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => {
            log::debug!("Result {} not found", id);
            Err(ApiError::not_found(RESULT_NOT_FOUND))
        }
        Err(e) => {
            log::error!(
                "Failed to load result {} from {} store: {}",
                id,
                state.store.backend_name(),
                e
            );
            Err(ApiError::internal("Failed to load result"))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
pub async fn health_handler() -> Json<HealthInfo> {
    Json(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
