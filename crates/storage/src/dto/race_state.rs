use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::EventStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RaceStateResponse {
    pub event_id: i64,
    pub status: EventStatus,
    pub ingest_paused: bool,
    pub standings_frozen: bool,
    pub frozen_at: Option<NaiveDateTime>,
    /// Punches stored during a pause and not yet processed.
    pub deferred_punches: i64,
}
