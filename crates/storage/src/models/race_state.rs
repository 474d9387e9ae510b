use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Race-day gates of an event. Both default to open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RaceState {
    pub event_id: i64,
    pub ingest_paused: bool,
    pub standings_frozen: bool,
    pub frozen_at: Option<NaiveDateTime>,
    /// JSON-encoded overall standings captured when the freeze started.
    pub frozen_snapshot: Option<String>,
}
