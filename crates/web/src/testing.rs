//! Seed data shared by the web tests.

use chrono::NaiveDate;
use storage::{
    dto::chip::CreateChipRequest,
    dto::class::CreateClassRequest,
    dto::control::CreateControlRequest,
    dto::course::CreateCourseRequest,
    dto::entry::CreateEntryRequest,
    dto::event::CreateEventRequest,
    dto::stage::CreateStageRequest,
    models::{ControlType, TimePrecision},
    repository::{
        chip::ChipRepository, class::ClassRepository, control::ControlRepository,
        course::CourseRepository, entry::EntryRepository, event::EventRepository,
        stage::StageRepository,
    },
};

use crate::state::AppState;

pub struct Seeded {
    pub event_id: i64,
    pub stage_id: i64,
    pub class_id: i64,
}

/// One event on 2025-06-14 (tenths) with a single stage between controls
/// 31 and 32, class "Open" and bib 101 carrying transponder "8001".
pub async fn seed_event(state: &AppState) -> Seeded {
    let pool = state.db.pool();

    let event = EventRepository::new(pool)
        .create(&CreateEventRequest {
            name: "Enduro".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            location: None,
            format: None,
            time_precision: TimePrecision::Tenths,
        })
        .await
        .unwrap();
    let event_id = event.event_id;

    let controls = ControlRepository::new(pool);
    let start = controls
        .create(
            event_id,
            &CreateControlRequest {
                code: 31,
                name: "Start 1".to_string(),
                control_type: ControlType::Start,
            },
        )
        .await
        .unwrap();
    let finish = controls
        .create(
            event_id,
            &CreateControlRequest {
                code: 32,
                name: "Finish 1".to_string(),
                control_type: ControlType::Finish,
            },
        )
        .await
        .unwrap();

    let stage = StageRepository::new(pool)
        .create(
            event_id,
            &CreateStageRequest {
                stage_number: 1,
                name: "Stage 1".to_string(),
                start_control_id: start.control_id,
                finish_control_id: finish.control_id,
                is_timed: true,
                runs_to_count: 1,
                max_runs: None,
            },
        )
        .await
        .unwrap();

    let course = CourseRepository::new(pool)
        .create(
            event_id,
            &CreateCourseRequest {
                name: "Long".to_string(),
                laps: 1,
                stages_any_order: false,
                allow_repeat: false,
                stage_ids: vec![stage.stage_id],
            },
        )
        .await
        .unwrap();

    let class = ClassRepository::new(pool)
        .create(
            event_id,
            &CreateClassRequest {
                name: "Open".to_string(),
                course_id: course.course.course_id,
            },
        )
        .await
        .unwrap();

    EntryRepository::new(pool)
        .create(
            event_id,
            &CreateEntryRequest {
                bib: 101,
                first_name: "Ada".to_string(),
                last_name: "Rider".to_string(),
                club: None,
                class_id: class.class_id,
            },
        )
        .await
        .unwrap();

    ChipRepository::new(pool)
        .create(
            event_id,
            &CreateChipRequest {
                bib: 101,
                siac: "8001".to_string(),
                is_primary: true,
            },
        )
        .await
        .unwrap();

    Seeded {
        event_id,
        stage_id: stage.stage_id,
        class_id: class.class_id,
    }
}
