use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStageRequest {
    #[validate(range(min = 1))]
    pub stage_number: i64,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub start_control_id: i64,

    pub finish_control_id: i64,

    #[serde(default = "default_true")]
    pub is_timed: bool,

    #[serde(default = "default_runs_to_count")]
    #[validate(range(min = 1, message = "runs_to_count must be at least 1"))]
    pub runs_to_count: i64,

    #[validate(range(min = 1, message = "max_runs must be at least 1"))]
    pub max_runs: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStageRequest {
    #[validate(range(min = 1))]
    pub stage_number: Option<i64>,

    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub start_control_id: Option<i64>,

    pub finish_control_id: Option<i64>,

    pub is_timed: Option<bool>,

    #[validate(range(min = 1, message = "runs_to_count must be at least 1"))]
    pub runs_to_count: Option<i64>,

    /// `Some(None)` clears the cap.
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub max_runs: Option<Option<i64>>,
}

fn default_true() -> bool {
    true
}

fn default_runs_to_count() -> i64 {
    1
}

/// Checks the cross-field stage invariants shared by create and update.
pub fn check_stage_shape(
    start_control_id: i64,
    finish_control_id: i64,
    runs_to_count: i64,
    max_runs: Option<i64>,
) -> Result<(), &'static str> {
    if start_control_id == finish_control_id {
        return Err("Start and finish controls must differ");
    }

    if let Some(max_runs) = max_runs
        && runs_to_count > max_runs
    {
        return Err("runs_to_count cannot exceed max_runs");
    }

    Ok(())
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<i64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<i64>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_shape_rejects_same_controls() {
        assert!(check_stage_shape(3, 3, 1, None).is_err());
        assert!(check_stage_shape(3, 4, 1, None).is_ok());
    }

    #[test]
    fn test_stage_shape_rejects_count_above_cap() {
        assert!(check_stage_shape(1, 2, 3, Some(2)).is_err());
        assert!(check_stage_shape(1, 2, 2, Some(4)).is_ok());
    }

    #[test]
    fn test_update_distinguishes_cleared_cap() {
        let cleared: UpdateStageRequest = serde_json::from_str(r#"{"max_runs": null}"#).unwrap();
        assert_eq!(cleared.max_runs, Some(None));

        let untouched: UpdateStageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.max_runs, None);
    }
}
