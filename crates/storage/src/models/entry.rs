use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Entry {
    pub entry_id: i64,
    pub event_id: i64,
    pub bib: i64,
    pub first_name: String,
    pub last_name: String,
    pub club: Option<String>,
    pub class_id: i64,
}

impl Entry {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
