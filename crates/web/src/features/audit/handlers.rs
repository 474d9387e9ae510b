use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use storage::{dto::audit::AuditQuery, models::AuditLogEntry};

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit entries, most recent first", body = Vec<AuditLogEntry>),
        (status = 400, description = "Invalid limit")
    ),
    tag = "audit"
)]
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Response, WebError> {
    query.validate().map_err(WebError::BadRequest)?;

    let entries = services::list(&state.db, &query).await?;

    Ok(Json(entries).into_response())
}
