use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Course;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default = "default_laps")]
    #[validate(range(min = 1, max = 100, message = "laps must be between 1 and 100"))]
    pub laps: i64,

    #[serde(default)]
    pub stages_any_order: bool,

    #[serde(default)]
    pub allow_repeat: bool,

    /// Stage ids in course order.
    #[serde(default)]
    pub stage_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(range(min = 1, max = 100, message = "laps must be between 1 and 100"))]
    pub laps: Option<i64>,

    pub stages_any_order: Option<bool>,

    pub allow_repeat: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetCourseStagesRequest {
    pub stage_ids: Vec<i64>,
}

/// A course together with its ordered stage membership
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    #[serde(flatten)]
    pub course: Course,
    pub stage_ids: Vec<i64>,
}

fn default_laps() -> i64 {
    1
}
