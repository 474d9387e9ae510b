use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBackupRequest {
    #[validate(length(min = 1, max = 100, message = "Label must be between 1 and 100 characters"))]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreRequest {
    pub filename: String,
    /// Restore replaces all current state and is refused unless set.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntityCounts {
    pub events: usize,
    pub controls: usize,
    pub stages: usize,
    pub courses: usize,
    pub course_stages: usize,
    pub classes: usize,
    pub entries: usize,
    pub chips: usize,
    pub punches: usize,
    pub race_states: usize,
    pub audit_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BackupDescriptor {
    pub filename: String,
    pub label: String,
    pub created_at: NaiveDateTime,
    pub counts: EntityCounts,
}
