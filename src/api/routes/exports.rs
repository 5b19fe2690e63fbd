//! Export run handlers.

use super::StartExportResponse;
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::ExportRequest;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// POST /exports - Start an export run
#[utoipa::path(
    post,
    path = "/exports",
    tag = "exports",
    request_body = ExportRequest,
    responses(
        (status = 202, description = "Export started", body = StartExportResponse),
        (status = 409, description = "Another export is already running", body = ApiError),
        (status = 503, description = "Shutting down", body = ApiError)
    )
)]
pub async fn start_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> impl IntoResponse {
    match state.orchestrator.start(request) {
        Ok(run_id) => (StatusCode::ACCEPTED, Json(StartExportResponse { run_id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /exports/progress - Current progress
#[utoipa::path(
    get,
    path = "/exports/progress",
    tag = "exports",
    responses(
        (status = 200, description = "Current progress", body = crate::types::DownloadProgress)
    )
)]
pub async fn get_progress(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.progress())
}

/// GET /exports/result - Outcome of the most recent run
#[utoipa::path(
    get,
    path = "/exports/result",
    tag = "exports",
    responses(
        (status = 200, description = "Outcome of the most recent run", body = crate::types::RunOutcome),
        (status = 404, description = "No run has finished yet", body = ApiError)
    )
)]
pub async fn get_result(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.last_outcome().await {
        Some(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        None => ApiError::not_found("export result").into_response(),
    }
}

/// POST /exports/cancel - Cancel the active run
#[utoipa::path(
    post,
    path = "/exports/cancel",
    tag = "exports",
    responses(
        (status = 204, description = "Cancellation requested; the run stops before its next part"),
        (status = 409, description = "No export is running", body = ApiError)
    )
)]
pub async fn cancel_export(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.cancel() {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
