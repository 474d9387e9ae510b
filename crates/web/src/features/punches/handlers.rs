use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::punch::{CreatePunchRequest, IngestOutcome, PunchFilter},
    models::Punch,
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/punches",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        PunchFilter
    ),
    responses(
        (status = 200, description = "Punches, newest first", body = Vec<Punch>),
        (status = 400, description = "Invalid filter"),
        (status = 404, description = "Event not found")
    ),
    tag = "punches"
)]
pub async fn list_punches(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Query(filter): Query<PunchFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let punches = services::list_punches(&state.db, event_id, &filter).await?;

    Ok(Json(punches).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/punches/{punch_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("punch_id" = i64, Path, description = "Punch id")
    ),
    responses(
        (status = 200, description = "Punch found", body = Punch),
        (status = 404, description = "Punch not found")
    ),
    tag = "punches"
)]
pub async fn get_punch(
    State(state): State<AppState>,
    Path((event_id, punch_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    let punch = services::get_punch(&state.db, event_id, punch_id).await?;

    Ok(Json(punch).into_response())
}

/// Manual entry and chip readers share this path. A punch received while
/// ingest is paused is stored and reported as deferred.
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/punches",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreatePunchRequest,
    responses(
        (status = 201, description = "Punch stored", body = IngestOutcome),
        (status = 400, description = "Unknown control or unreadable timestamp"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event is finished")
    ),
    tag = "punches"
)]
pub async fn create_punch(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreatePunchRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let outcome = services::create_punch(
        &state.db,
        &state.hub,
        state.ingest_settings(),
        event_id,
        req.into_new_punch(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/punches/{punch_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("punch_id" = i64, Path, description = "Punch id")
    ),
    responses(
        (status = 204, description = "Punch removed from the log"),
        (status = 404, description = "Punch not found")
    ),
    tag = "punches"
)]
pub async fn delete_punch(
    State(state): State<AppState>,
    Path((event_id, punch_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_punch(&state.db, &state.hub, event_id, punch_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
