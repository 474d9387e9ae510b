//! Race fixtures shared by the service tests.

use chrono::NaiveDate;

use super::ingest::{IngestSettings, record_punch};
use crate::Database;
use crate::dto::chip::CreateChipRequest;
use crate::dto::class::CreateClassRequest;
use crate::dto::control::CreateControlRequest;
use crate::dto::course::CreateCourseRequest;
use crate::dto::entry::CreateEntryRequest;
use crate::dto::event::CreateEventRequest;
use crate::dto::punch::{IngestOutcome, NewPunch};
use crate::dto::stage::CreateStageRequest;
use crate::error::Result;
use crate::models::{ControlType, Entry, PunchSource, TimePrecision};
use crate::repository::chip::ChipRepository;
use crate::repository::class::ClassRepository;
use crate::repository::control::ControlRepository;
use crate::repository::course::CourseRepository;
use crate::repository::entry::EntryRepository;
use crate::repository::event::EventRepository;
use crate::repository::stage::StageRepository;

#[derive(Debug, Clone, Copy)]
pub(crate) struct StageSpec {
    pub runs_to_count: i64,
    pub max_runs: Option<i64>,
    pub is_timed: bool,
}

impl StageSpec {
    pub fn timed(runs_to_count: i64, max_runs: Option<i64>) -> Self {
        Self {
            runs_to_count,
            max_runs,
            is_timed: true,
        }
    }

    pub fn untimed() -> Self {
        Self {
            runs_to_count: 1,
            max_runs: None,
            is_timed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CourseSpec {
    pub laps: i64,
    pub stages_any_order: bool,
    pub allow_repeat: bool,
    /// Indices into the stage list, in course order.
    pub order: Vec<usize>,
}

impl CourseSpec {
    pub fn in_order(stage_count: usize) -> Self {
        Self {
            laps: 1,
            stages_any_order: false,
            allow_repeat: false,
            order: (0..stage_count).collect(),
        }
    }
}

/// One event with a single class riding one course.
///
/// Stage `k` starts at control `31 + 10k` and finishes at `32 + 10k`.
pub(crate) struct Fixture {
    pub db: Database,
    pub event_id: i64,
    pub stage_ids: Vec<i64>,
    pub class_id: i64,
}

impl Fixture {
    pub async fn single_stage(runs_to_count: i64, max_runs: Option<i64>) -> Self {
        Self::build(
            &[StageSpec::timed(runs_to_count, max_runs)],
            CourseSpec::in_order(1),
        )
        .await
    }

    pub async fn build(stages: &[StageSpec], course: CourseSpec) -> Self {
        let db = Database::in_memory().await.unwrap();
        Self::build_in(db, "Enduro Cup", stages, course).await
    }

    pub async fn build_in(db: Database, name: &str, stages: &[StageSpec], course: CourseSpec) -> Self {
        let event = EventRepository::new(db.pool())
            .create(&CreateEventRequest {
                name: name.to_string(),
                event_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
                location: Some("Järvsö".to_string()),
                format: Some("enduro".to_string()),
                time_precision: TimePrecision::Tenths,
            })
            .await
            .unwrap();

        let controls = ControlRepository::new(db.pool());
        let stage_repo = StageRepository::new(db.pool());
        let mut stage_ids = Vec::new();

        for (k, spec) in stages.iter().enumerate() {
            let base = 31 + 10 * k as i64;
            let start = controls
                .create(
                    event.event_id,
                    &CreateControlRequest {
                        code: base,
                        name: format!("Start {}", k + 1),
                        control_type: ControlType::Start,
                    },
                )
                .await
                .unwrap();
            let finish = controls
                .create(
                    event.event_id,
                    &CreateControlRequest {
                        code: base + 1,
                        name: format!("Finish {}", k + 1),
                        control_type: ControlType::Finish,
                    },
                )
                .await
                .unwrap();

            let stage = stage_repo
                .create(
                    event.event_id,
                    &CreateStageRequest {
                        stage_number: k as i64 + 1,
                        name: format!("SS{}", k + 1),
                        start_control_id: start.control_id,
                        finish_control_id: finish.control_id,
                        is_timed: spec.is_timed,
                        runs_to_count: spec.runs_to_count,
                        max_runs: spec.max_runs,
                    },
                )
                .await
                .unwrap();
            stage_ids.push(stage.stage_id);
        }

        let created = CourseRepository::new(db.pool())
            .create(
                event.event_id,
                &CreateCourseRequest {
                    name: "Long".to_string(),
                    laps: course.laps,
                    stages_any_order: course.stages_any_order,
                    allow_repeat: course.allow_repeat,
                    stage_ids: course.order.iter().map(|&i| stage_ids[i]).collect(),
                },
            )
            .await
            .unwrap();

        let class = ClassRepository::new(db.pool())
            .create(
                event.event_id,
                &CreateClassRequest {
                    name: "Open".to_string(),
                    course_id: created.course.course_id,
                },
            )
            .await
            .unwrap();

        Self {
            db,
            event_id: event.event_id,
            stage_ids,
            class_id: class.class_id,
        }
    }

    /// Registers bib with one primary chip.
    pub async fn entrant(&self, bib: i64, siac: &str) -> Entry {
        let entry = EntryRepository::new(self.db.pool())
            .create(
                self.event_id,
                &CreateEntryRequest {
                    bib,
                    first_name: "Rider".to_string(),
                    last_name: bib.to_string(),
                    club: None,
                    class_id: self.class_id,
                },
            )
            .await
            .unwrap();

        ChipRepository::new(self.db.pool())
            .create(
                self.event_id,
                &CreateChipRequest {
                    bib,
                    siac: siac.to_string(),
                    is_primary: true,
                },
            )
            .await
            .unwrap();

        entry
    }

    pub async fn try_punch(&self, siac: &str, code: i64, time: &str) -> Result<IngestOutcome> {
        record_punch(
            &self.db,
            IngestSettings::default(),
            self.event_id,
            NewPunch {
                siac: siac.to_string(),
                control_code: code,
                timestamp: time.to_string(),
                source: PunchSource::Manual,
            },
        )
        .await
    }

    pub async fn punch(&self, siac: &str, code: i64, time: &str) -> IngestOutcome {
        self.try_punch(siac, code, time).await.unwrap()
    }

    /// A start and finish punch on stage `k`.
    pub async fn ride(&self, siac: &str, k: usize, start: &str, finish: &str) {
        let base = 31 + 10 * k as i64;
        self.punch(siac, base, start).await;
        self.punch(siac, base + 1, finish).await;
    }
}
