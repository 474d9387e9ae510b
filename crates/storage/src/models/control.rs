use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ControlType {
    Start,
    Finish,
    Split,
}

impl ControlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Finish => "finish",
            Self::Split => "split",
        }
    }
}

impl FromStr for ControlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "finish" => Ok(Self::Finish),
            "split" => Ok(Self::Split),
            other => Err(format!("unknown control type '{other}'")),
        }
    }
}

impl TryFrom<String> for ControlType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A physical timing point, identified within its event by `code`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Control {
    pub control_id: i64,
    pub event_id: i64,
    pub code: i64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub control_type: ControlType,
}
