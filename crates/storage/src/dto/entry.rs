use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEntryRequest {
    #[validate(range(min = 1, message = "Bib must be a positive number"))]
    pub bib: i64,

    #[validate(length(min = 1, max = 255))]
    pub first_name: String,

    #[validate(length(min = 1, max = 255))]
    pub last_name: String,

    #[validate(length(max = 255))]
    pub club: Option<String>,

    pub class_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEntryRequest {
    #[validate(range(min = 1, message = "Bib must be a positive number"))]
    pub bib: Option<i64>,

    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,

    #[validate(length(max = 255))]
    pub club: Option<String>,

    pub class_id: Option<i64>,
}

/// One row of a bulk entry import. The class is referenced by name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryImportRow {
    pub bib: i64,
    pub first_name: String,
    pub last_name: String,
    pub club: Option<String>,
    pub class: String,
}
