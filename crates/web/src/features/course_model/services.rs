use serde::Serialize;
use storage::{
    Database,
    dto::audit::NewAuditEntry,
    dto::class::{CreateClassRequest, UpdateClassRequest},
    dto::control::{CreateControlRequest, UpdateControlRequest},
    dto::course::{CourseResponse, CreateCourseRequest, SetCourseStagesRequest, UpdateCourseRequest},
    dto::stage::{CreateStageRequest, UpdateStageRequest},
    error::Result,
    models::{Class, Control, Stage},
    repository::class::ClassRepository,
    repository::control::ControlRepository,
    repository::course::CourseRepository,
    repository::event::EventRepository,
    repository::stage::StageRepository,
};

use crate::features::audit::services as audit;

async fn audited<T: Serialize>(
    db: &Database,
    event_id: i64,
    action: &str,
    entity_type: &str,
    entity_id: i64,
    details: &T,
) -> Result<()> {
    audit::record(
        db,
        NewAuditEntry::new(Some(event_id), action, entity_type)
            .entity(entity_id)
            .details(details),
    )
    .await
}

async fn ensure_event(db: &Database, event_id: i64) -> Result<()> {
    EventRepository::new(db.pool()).find_by_id(event_id).await?;
    Ok(())
}

// Controls

pub async fn list_controls(db: &Database, event_id: i64) -> Result<Vec<Control>> {
    ensure_event(db, event_id).await?;
    ControlRepository::new(db.pool()).list(event_id).await
}

pub async fn get_control(db: &Database, event_id: i64, control_id: i64) -> Result<Control> {
    ControlRepository::new(db.pool()).find_by_id(event_id, control_id).await
}

pub async fn create_control(db: &Database, event_id: i64, req: &CreateControlRequest) -> Result<Control> {
    ensure_event(db, event_id).await?;
    let control = ControlRepository::new(db.pool()).create(event_id, req).await?;
    audited(db, event_id, "control.create", "control", control.control_id, req).await?;
    Ok(control)
}

pub async fn update_control(
    db: &Database,
    event_id: i64,
    control_id: i64,
    req: &UpdateControlRequest,
) -> Result<Control> {
    let repo = ControlRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, control_id).await?;
    let control = repo.update(&existing, req).await?;
    audited(db, event_id, "control.update", "control", control_id, req).await?;
    Ok(control)
}

/// Fails with a referential error while a stage still uses the control
pub async fn delete_control(db: &Database, event_id: i64, control_id: i64) -> Result<()> {
    let repo = ControlRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, control_id).await?;
    repo.delete(event_id, control_id).await?;
    audited(db, event_id, "control.delete", "control", control_id, &existing).await
}

// Stages

pub async fn list_stages(db: &Database, event_id: i64) -> Result<Vec<Stage>> {
    ensure_event(db, event_id).await?;
    StageRepository::new(db.pool()).list(event_id).await
}

pub async fn get_stage(db: &Database, event_id: i64, stage_id: i64) -> Result<Stage> {
    StageRepository::new(db.pool()).find_by_id(event_id, stage_id).await
}

pub async fn create_stage(db: &Database, event_id: i64, req: &CreateStageRequest) -> Result<Stage> {
    ensure_event(db, event_id).await?;
    let stage = StageRepository::new(db.pool()).create(event_id, req).await?;
    audited(db, event_id, "stage.create", "stage", stage.stage_id, req).await?;
    Ok(stage)
}

pub async fn update_stage(
    db: &Database,
    event_id: i64,
    stage_id: i64,
    req: &UpdateStageRequest,
) -> Result<Stage> {
    let repo = StageRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, stage_id).await?;
    let stage = repo.update(&existing, req).await?;
    audited(db, event_id, "stage.update", "stage", stage_id, req).await?;
    Ok(stage)
}

pub async fn delete_stage(db: &Database, event_id: i64, stage_id: i64) -> Result<()> {
    let repo = StageRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, stage_id).await?;
    repo.delete(event_id, stage_id).await?;
    audited(db, event_id, "stage.delete", "stage", stage_id, &existing).await
}

// Courses

pub async fn list_courses(db: &Database, event_id: i64) -> Result<Vec<CourseResponse>> {
    ensure_event(db, event_id).await?;
    CourseRepository::new(db.pool()).list(event_id).await
}

pub async fn get_course(db: &Database, event_id: i64, course_id: i64) -> Result<CourseResponse> {
    CourseRepository::new(db.pool()).find_by_id(event_id, course_id).await
}

pub async fn create_course(
    db: &Database,
    event_id: i64,
    req: &CreateCourseRequest,
) -> Result<CourseResponse> {
    ensure_event(db, event_id).await?;
    let course = CourseRepository::new(db.pool()).create(event_id, req).await?;
    audited(db, event_id, "course.create", "course", course.course.course_id, req).await?;
    Ok(course)
}

pub async fn update_course(
    db: &Database,
    event_id: i64,
    course_id: i64,
    req: &UpdateCourseRequest,
) -> Result<CourseResponse> {
    let repo = CourseRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, course_id).await?;
    let course = repo.update(&existing.course, req).await?;
    audited(db, event_id, "course.update", "course", course_id, req).await?;

    Ok(CourseResponse {
        course,
        stage_ids: existing.stage_ids,
    })
}

/// Replaces the ordered stage membership of a course
pub async fn set_course_stages(
    db: &Database,
    event_id: i64,
    course_id: i64,
    req: &SetCourseStagesRequest,
) -> Result<CourseResponse> {
    let repo = CourseRepository::new(db.pool());
    repo.find_by_id(event_id, course_id).await?;
    repo.set_stages(event_id, course_id, &req.stage_ids).await?;
    audited(db, event_id, "course.set_stages", "course", course_id, req).await?;

    repo.find_by_id(event_id, course_id).await
}

pub async fn delete_course(db: &Database, event_id: i64, course_id: i64) -> Result<()> {
    let repo = CourseRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, course_id).await?;
    repo.delete(event_id, course_id).await?;
    audited(db, event_id, "course.delete", "course", course_id, &existing).await
}

// Classes

pub async fn list_classes(db: &Database, event_id: i64) -> Result<Vec<Class>> {
    ensure_event(db, event_id).await?;
    ClassRepository::new(db.pool()).list(event_id).await
}

pub async fn get_class(db: &Database, event_id: i64, class_id: i64) -> Result<Class> {
    ClassRepository::new(db.pool()).find_by_id(event_id, class_id).await
}

pub async fn create_class(db: &Database, event_id: i64, req: &CreateClassRequest) -> Result<Class> {
    ensure_event(db, event_id).await?;
    let class = ClassRepository::new(db.pool()).create(event_id, req).await?;
    audited(db, event_id, "class.create", "class", class.class_id, req).await?;
    Ok(class)
}

pub async fn update_class(
    db: &Database,
    event_id: i64,
    class_id: i64,
    req: &UpdateClassRequest,
) -> Result<Class> {
    let repo = ClassRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, class_id).await?;
    let class = repo.update(&existing, req).await?;
    audited(db, event_id, "class.update", "class", class_id, req).await?;
    Ok(class)
}

pub async fn delete_class(db: &Database, event_id: i64, class_id: i64) -> Result<()> {
    let repo = ClassRepository::new(db.pool());
    let existing = repo.find_by_id(event_id, class_id).await?;
    repo.delete(event_id, class_id).await?;
    audited(db, event_id, "class.delete", "class", class_id, &existing).await
}
