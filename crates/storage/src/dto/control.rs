use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::ControlType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateControlRequest {
    #[validate(range(min = 1, max = 9999, message = "Code must be between 1 and 9999"))]
    pub code: i64,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub control_type: ControlType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateControlRequest {
    #[validate(range(min = 1, max = 9999, message = "Code must be between 1 and 9999"))]
    pub code: Option<i64>,

    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub control_type: Option<ControlType>,
}
