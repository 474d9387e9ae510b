use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PunchSource {
    ChipReader,
    Manual,
    ExternalBridge,
}

impl PunchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChipReader => "chip_reader",
            Self::Manual => "manual",
            Self::ExternalBridge => "external_bridge",
        }
    }
}

impl FromStr for PunchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chip_reader" => Ok(Self::ChipReader),
            "manual" => Ok(Self::Manual),
            "external_bridge" => Ok(Self::ExternalBridge),
            other => Err(format!("unknown punch source '{other}'")),
        }
    }
}

impl TryFrom<String> for PunchSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One row of the timing log.
///
/// `processed` is false while the punch waits behind an ingest pause; such
/// punches carry no duplicate classification yet and are ignored by results.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Punch {
    pub punch_id: i64,
    pub event_id: i64,
    pub siac: String,
    pub control_code: i64,
    pub punch_time: NaiveDateTime,
    #[sqlx(try_from = "String")]
    pub source: PunchSource,
    pub is_duplicate: bool,
    pub processed: bool,
    pub received_at: NaiveDateTime,
}

impl Punch {
    /// Whether the punch takes part in result computation.
    pub fn counts(&self) -> bool {
        self.processed && !self.is_duplicate
    }
}
