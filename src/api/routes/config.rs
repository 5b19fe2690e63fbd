//! Configuration handlers.

use super::InterPartDelay;
use crate::api::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::time::Duration;

/// GET /config - Get current config
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration", body = crate::config::Config)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let mut config = (*state.orchestrator.get_config()).clone();
    // Report the live value, which may differ from the startup one
    config.export.inter_part_delay = state.orchestrator.get_inter_part_delay().await;

    (StatusCode::OK, Json(config))
}

/// GET /config/inter-part-delay - Get pause between parts
#[utoipa::path(
    get,
    path = "/config/inter-part-delay",
    tag = "config",
    responses(
        (status = 200, description = "Current pause between parts", body = InterPartDelay)
    )
)]
pub async fn get_inter_part_delay(State(state): State<AppState>) -> impl IntoResponse {
    let delay = state.orchestrator.get_inter_part_delay().await;
    Json(InterPartDelay {
        delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
    })
}

/// PUT /config/inter-part-delay - Set pause between parts
#[utoipa::path(
    put,
    path = "/config/inter-part-delay",
    tag = "config",
    request_body = InterPartDelay,
    responses(
        (status = 204, description = "Pause updated; applies from the next pause on")
    )
)]
pub async fn set_inter_part_delay(
    State(state): State<AppState>,
    Json(request): Json<InterPartDelay>,
) -> impl IntoResponse {
    state
        .orchestrator
        .set_inter_part_delay(Duration::from_millis(request.delay_ms))
        .await;
    StatusCode::NO_CONTENT
}
