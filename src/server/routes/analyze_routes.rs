//! POST /api/analyze

use super::ApiError;
use crate::models::AnalysisRequest;
use crate::server::events::{sse_response, EVENT_BUFFER};
use crate::server::ServerAppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use tokio::sync::mpsc;

pub const IDEA_REQUIRED: &str = "idea is required";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    #[serde(default)]
    pub idea: Option<String>,
    #[serde(default)]
    pub skill_level: Option<String>,
}

/// Validate the idea, start the pipeline in the background and stream its notifications
pub async fn analyze_handler(
    State(state): State<ServerAppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        log::debug!("Rejected analyze body: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;

    let request = AnalysisRequest::new(body.idea, body.skill_level)
        .ok_or_else(|| ApiError::bad_request(IDEA_REQUIRED))?;

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let orchestrator = state.orchestrator.clone();
    let guard = state.shutdown_state.begin_run();

    // Runs to completion even if the client goes away, so finished work is still stored
    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = orchestrator.run(request, tx).await {
            log::debug!("Analysis run ended with error: {}", e);
        }
    });

    Ok(sse_response(rx))
}
