use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::results::StageResult;
use crate::models::{Punch, PunchSource};

/// Punch submitted by an operator or a chip reader.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePunchRequest {
    #[validate(length(min = 1, max = 32, message = "Transponder id must be 1 to 32 characters"))]
    pub siac: String,

    #[validate(range(min = 1, max = 9999, message = "Control code must be between 1 and 9999"))]
    pub control_code: i64,

    #[validate(length(min = 1, max = 64))]
    pub timestamp: String,

    /// Defaults to `manual` when omitted.
    pub source: Option<PunchSource>,
}

impl CreatePunchRequest {
    pub fn into_new_punch(self) -> NewPunch {
        NewPunch {
            siac: self.siac,
            control_code: self.control_code,
            timestamp: self.timestamp,
            source: self.source.unwrap_or(PunchSource::Manual),
        }
    }
}

/// Input to the single ingestion path shared by every punch source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPunch {
    pub siac: String,
    pub control_code: i64,
    pub timestamp: String,
    pub source: PunchSource,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PunchFilter {
    pub source: Option<PunchSource>,
    pub duplicate: Option<bool>,
    pub processed: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PunchFilter {
    fn default() -> Self {
        Self {
            source: None,
            duplicate: None,
            processed: None,
            limit: default_limit(),
        }
    }
}

impl PunchFilter {
    pub fn validate(&self) -> Result<(), String> {
        if self.limit < 1 || self.limit > 10_000 {
            return Err("limit must be between 1 and 10000".to_string());
        }
        Ok(())
    }
}

fn default_limit() -> i64 {
    500
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// Stored and processed as an original punch.
    Accepted,
    /// Stored, flagged as duplicate and excluded from results.
    Duplicate,
    /// Stored while ingest is paused; processed on resume.
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestOutcome {
    pub punch: Punch,
    pub status: IngestStatus,
    /// The entrant's result on the stage this punch affects, if any.
    pub stage_result: Option<StageResult>,
}
