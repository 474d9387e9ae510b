use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A timed segment between two distinct controls.
///
/// `max_runs` caps how many start/finish pairs are considered per entry and
/// the fastest `runs_to_count` of those make up the stage time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Stage {
    pub stage_id: i64,
    pub event_id: i64,
    pub stage_number: i64,
    pub name: String,
    pub start_control_id: i64,
    pub finish_control_id: i64,
    pub is_timed: bool,
    pub runs_to_count: i64,
    pub max_runs: Option<i64>,
}
