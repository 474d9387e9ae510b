use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::TimePrecision;

/// Request payload for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    pub event_date: NaiveDate,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(length(max = 64))]
    pub format: Option<String>,

    #[serde(default)]
    pub time_precision: TimePrecision,
}

/// Request payload for updating an existing event. Lifecycle status is
/// changed through the activate/finish actions only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub event_date: Option<NaiveDate>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(length(max = 64))]
    pub format: Option<String>,

    pub time_precision: Option<TimePrecision>,
}
