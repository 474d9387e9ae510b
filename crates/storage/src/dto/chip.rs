use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateChipRequest {
    #[validate(range(min = 1, message = "Bib must be a positive number"))]
    pub bib: i64,

    #[validate(length(min = 1, max = 32, message = "Transponder id must be 1 to 32 characters"))]
    pub siac: String,

    #[serde(default = "default_primary")]
    pub is_primary: bool,
}

/// Replace a chip's transponder or make it the bib's primary chip.
///
/// Clearing `is_primary` on the primary chip hands primacy to the bib's
/// newest other chip; a bib's only chip stays primary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateChipRequest {
    #[validate(length(min = 1, max = 32, message = "Transponder id must be 1 to 32 characters"))]
    pub siac: Option<String>,

    pub is_primary: Option<bool>,
}

/// One row of a bulk chip import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChipImportRow {
    pub bib: i64,
    pub siac: String,
    #[serde(default = "default_primary")]
    pub is_primary: bool,
}

fn default_primary() -> bool {
    true
}
