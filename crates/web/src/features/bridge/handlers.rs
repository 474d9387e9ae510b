use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct StartBridgeRequest {
    /// Replaces the configured competition when given.
    #[validate(length(min = 1, max = 64))]
    pub competition: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfigureBridgeRequest {
    #[validate(length(min = 1, max = 64))]
    pub competition: String,
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/bridge",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Bridge status, counters and cursor"),
        (status = 404, description = "Event not found")
    ),
    tag = "bridge"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let snapshot = services::status(&state, event_id).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/bridge/configure",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = ConfigureBridgeRequest,
    responses(
        (status = 200, description = "Competition set; cursor reset when it changed"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found")
    ),
    tag = "bridge"
)]
pub async fn configure(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<ConfigureBridgeRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let snapshot = services::configure(&state, event_id, &req.competition).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/bridge/start",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = StartBridgeRequest,
    responses(
        (status = 200, description = "Bridge polling"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "No competition configured")
    ),
    tag = "bridge"
)]
pub async fn start(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    req: Option<Json<StartBridgeRequest>>,
) -> Result<Response, WebError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let snapshot = services::start(&state, event_id, req.competition.as_deref()).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/bridge/stop",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Bridge stopped; stopping a stopped bridge is a no-op"),
        (status = 404, description = "Event not found")
    ),
    tag = "bridge"
)]
pub async fn stop(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let snapshot = services::stop(&state, event_id).await?;

    Ok(Json(snapshot).into_response())
}
