use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Transponder assignment. A bib may own several chips over time but only
/// one of them is primary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Chip {
    pub chip_id: i64,
    pub event_id: i64,
    pub bib: i64,
    pub siac: String,
    pub is_primary: bool,
}
