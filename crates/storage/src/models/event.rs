use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::TimePrecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Setup,
    Active,
    Finished,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    /// Lifecycle only moves forward: setup, then active, then finished.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (Self::Setup, Self::Active) | (Self::Active, Self::Finished)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Self::Setup),
            "active" => Ok(Self::Active),
            "finished" => Ok(Self::Finished),
            other => Err(format!("unknown event status '{other}'")),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub event_id: i64,
    pub name: String,
    pub event_date: NaiveDate,
    pub location: Option<String>,
    pub format: Option<String>,
    #[sqlx(try_from = "String")]
    pub time_precision: TimePrecision,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_is_forward_only() {
        assert!(EventStatus::Setup.can_transition_to(EventStatus::Active));
        assert!(EventStatus::Active.can_transition_to(EventStatus::Finished));
        assert!(!EventStatus::Finished.can_transition_to(EventStatus::Active));
        assert!(!EventStatus::Setup.can_transition_to(EventStatus::Finished));
        assert!(!EventStatus::Active.can_transition_to(EventStatus::Active));
    }
}
