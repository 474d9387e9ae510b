use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::backup::{BackupDescriptor, CreateBackupRequest, EntityCounts, RestoreRequest};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/backups",
    responses(
        (status = 200, description = "Backups, newest first", body = Vec<BackupDescriptor>)
    ),
    tag = "backups"
)]
pub async fn list_backups(State(state): State<AppState>) -> Result<Response, WebError> {
    let backups = services::list_backups(&state).await?;

    Ok(Json(backups).into_response())
}

#[utoipa::path(
    post,
    path = "/api/backups",
    request_body = CreateBackupRequest,
    responses(
        (status = 201, description = "Backup written", body = BackupDescriptor),
        (status = 400, description = "Validation error")
    ),
    tag = "backups"
)]
pub async fn create_backup(
    State(state): State<AppState>,
    Json(req): Json<CreateBackupRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let descriptor = services::create_backup(&state, &req.label).await?;

    Ok((StatusCode::CREATED, Json(descriptor)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/backups/restore",
    request_body = RestoreRequest,
    responses(
        (status = 200, description = "State replaced by the backup", body = EntityCounts),
        (status = 400, description = "Invalid backup filename"),
        (status = 422, description = "Unsupported backup version"),
        (status = 404, description = "Backup not found"),
        (status = 412, description = "Restore was not confirmed")
    ),
    tag = "backups"
)]
pub async fn restore_backup(
    State(state): State<AppState>,
    Json(req): Json<RestoreRequest>,
) -> Result<Response, WebError> {
    let counts = services::restore_backup(&state, &req).await?;

    Ok(Json(counts).into_response())
}
