use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::dto::results::{ResultsQuery, StageResult, StandingsResponse};

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/stages/{stage_id}/results",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("stage_id" = i64, Path, description = "Stage id"),
        ResultsQuery
    ),
    responses(
        (status = 200, description = "Ranked stage results, grouped by class", body = Vec<StageResult>),
        (status = 404, description = "Stage not found")
    ),
    tag = "results"
)]
pub async fn get_stage_results(
    State(state): State<AppState>,
    Path((event_id, stage_id)): Path<(i64, i64)>,
    Query(query): Query<ResultsQuery>,
) -> Result<Response, WebError> {
    let results =
        services::get_stage_results(&state.db, event_id, stage_id, query.class_id).await?;

    Ok(Json(results).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/standings",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ResultsQuery
    ),
    responses(
        (status = 200, description = "Overall standings; the freeze snapshot while frozen unless live=true", body = StandingsResponse),
        (status = 404, description = "Event not found")
    ),
    tag = "results"
)]
pub async fn get_standings(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Query(query): Query<ResultsQuery>,
) -> Result<Response, WebError> {
    let standings = services::get_standings(
        &state.db,
        state.ingest_settings(),
        event_id,
        query.class_id,
        query.live,
    )
    .await?;

    Ok(Json(standings).into_response())
}
