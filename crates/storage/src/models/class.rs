use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub class_id: i64,
    pub event_id: i64,
    pub name: String,
    pub course_id: i64,
}
