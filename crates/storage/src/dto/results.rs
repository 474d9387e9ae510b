use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Ok,
    Dnf,
    Dns,
}

/// One start/finish pair of an entrant on a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunTime {
    pub start_time: NaiveDateTime,
    pub finish_time: NaiveDateTime,
    pub elapsed_ms: i64,
    pub counting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageResult {
    pub stage_id: i64,
    pub entry_id: i64,
    pub bib: i64,
    pub name: String,
    pub club: Option<String>,
    pub class_id: i64,
    pub class_name: String,
    pub status: ResultStatus,
    pub elapsed_ms: Option<i64>,
    pub elapsed: Option<String>,
    pub rank: Option<u32>,
    pub behind_ms: Option<i64>,
    pub behind: Option<String>,
    pub runs: Vec<RunTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OverallStageTime {
    pub stage_id: i64,
    pub stage_number: i64,
    pub status: ResultStatus,
    pub elapsed_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OverallResult {
    pub entry_id: i64,
    pub bib: i64,
    pub name: String,
    pub club: Option<String>,
    pub class_id: i64,
    pub class_name: String,
    pub status: ResultStatus,
    pub total_ms: Option<i64>,
    pub total: Option<String>,
    pub rank: Option<u32>,
    pub behind_ms: Option<i64>,
    pub behind: Option<String>,
    pub stages: Vec<OverallStageTime>,
}

/// Published overall standings; served from the freeze snapshot while
/// standings are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StandingsResponse {
    pub event_id: i64,
    pub frozen: bool,
    pub frozen_at: Option<NaiveDateTime>,
    pub results: Vec<OverallResult>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ResultsQuery {
    pub class_id: Option<i64>,
    /// Bypass the freeze snapshot and compute from the current log.
    #[serde(default)]
    pub live: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCounts {
    pub ok: usize,
    pub dnf: usize,
    pub dns: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: ResultStatus) {
        match status {
            ResultStatus::Ok => self.ok += 1,
            ResultStatus::Dnf => self.dnf += 1,
            ResultStatus::Dns => self.dns += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecomputeReport {
    pub event_id: i64,
    pub stages: usize,
    pub stage_results: StatusCounts,
    pub overall: StatusCounts,
    pub punches_considered: usize,
}
