use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use storage::dto::{race_state::RaceStateResponse, results::RecomputeReport};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::WebError;
use crate::hub::{HighlightPriority, StageState};
use crate::state::AppState;

use super::services;

#[derive(Debug, Serialize, ToSchema)]
pub struct ResumeResponse {
    #[serde(flatten)]
    pub state: RaceStateResponse,
    /// Deferred punches processed by this resume.
    pub processed: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct HighlightRequest {
    #[validate(length(min = 1, max = 500, message = "Text must be between 1 and 500 characters"))]
    pub text: String,
    #[serde(default = "default_priority")]
    pub priority: HighlightPriority,
}

fn default_priority() -> HighlightPriority {
    HighlightPriority::Normal
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StageStatusRequest {
    pub status: StageState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BroadcastReceipt {
    /// Clients the message was queued for.
    pub delivered: usize,
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/race-state",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Lifecycle status and gates", body = RaceStateResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn get_race_state(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let race_state = state.race_control().race_state(event_id).await?;

    Ok(Json(race_state).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/ingest/pause",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Ingest paused; new punches are stored but deferred", body = RaceStateResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn pause_ingest(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let race_state = state.race_control().pause_ingest(event_id).await?;

    Ok(Json(race_state).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/ingest/resume",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Ingest resumed; deferred punches processed in submission order", body = ResumeResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn resume_ingest(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let (race_state, processed) =
        services::resume_ingest(&state.race_control(), &state.db, &state.hub, event_id).await?;

    Ok(Json(ResumeResponse {
        state: race_state,
        processed,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/standings/freeze",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Standings frozen at their current state", body = RaceStateResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn freeze_standings(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let race_state = state.race_control().freeze_standings(event_id).await?;

    Ok(Json(race_state).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/standings/unfreeze",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Standings follow the live log again", body = RaceStateResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn unfreeze_standings(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let race_state =
        services::unfreeze_standings(&state.race_control(), &state.hub, event_id).await?;

    Ok(Json(race_state).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/recompute",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "All stage and overall results recomputed", body = RecomputeReport),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn recompute(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let report =
        services::recompute(&state.race_control(), &state.db, &state.hub, event_id).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/highlights",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = HighlightRequest,
    responses(
        (status = 202, description = "Highlight broadcast", body = BroadcastReceipt),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found")
    ),
    tag = "race"
)]
pub async fn post_highlight(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<HighlightRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    state.race_control().race_state(event_id).await?;

    let delivered = services::post_highlight(&state.hub, event_id, req.text, req.priority);

    Ok((StatusCode::ACCEPTED, Json(BroadcastReceipt { delivered })).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/stages/{stage_id}/status",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("stage_id" = i64, Path, description = "Stage id")
    ),
    request_body = StageStatusRequest,
    responses(
        (status = 202, description = "Stage status broadcast", body = BroadcastReceipt),
        (status = 404, description = "Stage not found")
    ),
    tag = "race"
)]
pub async fn post_stage_status(
    State(state): State<AppState>,
    Path((event_id, stage_id)): Path<(i64, i64)>,
    Json(req): Json<StageStatusRequest>,
) -> Result<Response, WebError> {
    let delivered =
        services::post_stage_status(&state.db, &state.hub, event_id, stage_id, req.status).await?;

    Ok((StatusCode::ACCEPTED, Json(BroadcastReceipt { delivered })).into_response())
}
