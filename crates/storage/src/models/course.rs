use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub course_id: i64,
    pub event_id: i64,
    pub name: String,
    pub laps: i64,
    pub stages_any_order: bool,
    pub allow_repeat: bool,
}

/// Ordered course membership row. `position` is significant unless the
/// course is run in any order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseStage {
    pub course_id: i64,
    pub stage_id: i64,
    pub position: i64,
}
