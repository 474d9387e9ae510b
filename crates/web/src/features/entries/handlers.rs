use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use storage::{
    dto::chip::{ChipImportRow, CreateChipRequest, UpdateChipRequest},
    dto::entry::{CreateEntryRequest, EntryImportRow, UpdateEntryRequest},
    dto::import::ImportReport,
    models::{Chip, Entry},
};
use utoipa::IntoParams;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EntryQuery {
    pub class_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/entries",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        EntryQuery
    ),
    responses(
        (status = 200, description = "Entries ordered by bib", body = Vec<Entry>),
        (status = 404, description = "Event not found")
    ),
    tag = "entries"
)]
pub async fn list_entries(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Query(query): Query<EntryQuery>,
) -> Result<Response, WebError> {
    let entries = services::list_entries(&state.db, event_id, query.class_id).await?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/entries/{entry_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("entry_id" = i64, Path, description = "Entry id")
    ),
    responses(
        (status = 200, description = "Entry found", body = Entry),
        (status = 404, description = "Entry not found")
    ),
    tag = "entries"
)]
pub async fn get_entry(
    State(state): State<AppState>,
    Path((event_id, entry_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    let entry = services::get_entry(&state.db, event_id, entry_id).await?;

    Ok(Json(entry).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/entries",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreateEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = Entry),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Bib already registered")
    ),
    tag = "entries"
)]
pub async fn create_entry(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let entry = services::create_entry(&state.db, event_id, &req).await?;

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/entries/{entry_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("entry_id" = i64, Path, description = "Entry id")
    ),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Entry updated", body = Entry),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Bib already registered")
    ),
    tag = "entries"
)]
pub async fn update_entry(
    State(state): State<AppState>,
    Path((event_id, entry_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let entry = services::update_entry(&state.db, event_id, entry_id, &req).await?;

    Ok(Json(entry).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/entries/{entry_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("entry_id" = i64, Path, description = "Entry id")
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Entry not found")
    ),
    tag = "entries"
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((event_id, entry_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_entry(&state.db, event_id, entry_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/entries/import",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = Vec<EntryImportRow>,
    responses(
        (status = 200, description = "Import summary; skipped rows are listed as warnings", body = ImportReport),
        (status = 404, description = "Event not found")
    ),
    tag = "entries"
)]
pub async fn import_entries(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(rows): Json<Vec<EntryImportRow>>,
) -> Result<Response, WebError> {
    let report = services::import_entries(&state.db, event_id, rows).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/entries/import/csv",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body(content = String, content_type = "text/csv", description = "bib,first_name,last_name,club,class"),
    responses(
        (status = 200, description = "Import summary; skipped rows are listed as warnings", body = ImportReport),
        (status = 400, description = "Unreadable CSV"),
        (status = 404, description = "Event not found")
    ),
    tag = "entries"
)]
pub async fn import_entries_csv(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    body: String,
) -> Result<Response, WebError> {
    let report = services::import_entries_csv(&state.db, event_id, &body).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/chips",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Chips ordered by bib", body = Vec<Chip>),
        (status = 404, description = "Event not found")
    ),
    tag = "entries"
)]
pub async fn list_chips(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let chips = services::list_chips(&state.db, event_id).await?;

    Ok(Json(chips).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/chips",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreateChipRequest,
    responses(
        (status = 201, description = "Chip registered", body = Chip),
        (status = 400, description = "Validation error or unknown bib"),
        (status = 409, description = "Transponder already registered")
    ),
    tag = "entries"
)]
pub async fn create_chip(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreateChipRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let chip = services::create_chip(&state.db, event_id, &req).await?;

    Ok((StatusCode::CREATED, Json(chip)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/chips/{chip_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("chip_id" = i64, Path, description = "Chip id")
    ),
    request_body = UpdateChipRequest,
    responses(
        (status = 200, description = "Chip updated; other chips of the bib are demoted or promoted to keep one primary", body = Chip),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Chip not found")
    ),
    tag = "entries"
)]
pub async fn update_chip(
    State(state): State<AppState>,
    Path((event_id, chip_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateChipRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let chip = services::update_chip(&state.db, event_id, chip_id, &req).await?;

    Ok(Json(chip).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/chips/{chip_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("chip_id" = i64, Path, description = "Chip id")
    ),
    responses(
        (status = 204, description = "Chip removed; a removed primary hands primacy to the newest remaining chip"),
        (status = 404, description = "Chip not found")
    ),
    tag = "entries"
)]
pub async fn delete_chip(
    State(state): State<AppState>,
    Path((event_id, chip_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_chip(&state.db, event_id, chip_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/chips/import",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = Vec<ChipImportRow>,
    responses(
        (status = 200, description = "Import summary; skipped rows are listed as warnings", body = ImportReport),
        (status = 404, description = "Event not found")
    ),
    tag = "entries"
)]
pub async fn import_chips(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(rows): Json<Vec<ChipImportRow>>,
) -> Result<Response, WebError> {
    let report = services::import_chips(&state.db, event_id, rows).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/chips/import/csv",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body(content = String, content_type = "text/csv", description = "bib,siac,primary"),
    responses(
        (status = 200, description = "Import summary; skipped rows are listed as warnings", body = ImportReport),
        (status = 400, description = "Unreadable CSV"),
        (status = 404, description = "Event not found")
    ),
    tag = "entries"
)]
pub async fn import_chips_csv(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    body: String,
) -> Result<Response, WebError> {
    let report = services::import_chips_csv(&state.db, event_id, &body).await?;

    Ok(Json(report).into_response())
}
