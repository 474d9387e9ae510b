use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::class::{CreateClassRequest, UpdateClassRequest},
    dto::control::{CreateControlRequest, UpdateControlRequest},
    dto::course::{CourseResponse, CreateCourseRequest, SetCourseStagesRequest, UpdateCourseRequest},
    dto::stage::{CreateStageRequest, UpdateStageRequest},
    models::{Class, Control, Stage},
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/controls",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Controls of the event", body = Vec<Control>),
        (status = 404, description = "Event not found")
    ),
    tag = "course_model"
)]
pub async fn list_controls(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let controls = services::list_controls(&state.db, event_id).await?;

    Ok(Json(controls).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/controls/{control_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("control_id" = i64, Path, description = "Control id")
    ),
    responses(
        (status = 200, description = "Control found", body = Control),
        (status = 404, description = "Control not found")
    ),
    tag = "course_model"
)]
pub async fn get_control(
    State(state): State<AppState>,
    Path((event_id, control_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    let control = services::get_control(&state.db, event_id, control_id).await?;

    Ok(Json(control).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/controls",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreateControlRequest,
    responses(
        (status = 201, description = "Control created", body = Control),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Duplicate code")
    ),
    tag = "course_model"
)]
pub async fn create_control(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreateControlRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let control = services::create_control(&state.db, event_id, &req).await?;

    Ok((StatusCode::CREATED, Json(control)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/controls/{control_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("control_id" = i64, Path, description = "Control id")
    ),
    request_body = UpdateControlRequest,
    responses(
        (status = 200, description = "Control updated", body = Control),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Control not found"),
        (status = 409, description = "Duplicate code")
    ),
    tag = "course_model"
)]
pub async fn update_control(
    State(state): State<AppState>,
    Path((event_id, control_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateControlRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let control = services::update_control(&state.db, event_id, control_id, &req).await?;

    Ok(Json(control).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/controls/{control_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("control_id" = i64, Path, description = "Control id")
    ),
    responses(
        (status = 204, description = "Control deleted"),
        (status = 404, description = "Control not found"),
        (status = 409, description = "Control is used by a stage")
    ),
    tag = "course_model"
)]
pub async fn delete_control(
    State(state): State<AppState>,
    Path((event_id, control_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_control(&state.db, event_id, control_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/stages",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Stages of the event", body = Vec<Stage>),
        (status = 404, description = "Event not found")
    ),
    tag = "course_model"
)]
pub async fn list_stages(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let stages = services::list_stages(&state.db, event_id).await?;

    Ok(Json(stages).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/stages/{stage_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("stage_id" = i64, Path, description = "Stage id")
    ),
    responses(
        (status = 200, description = "Stage found", body = Stage),
        (status = 404, description = "Stage not found")
    ),
    tag = "course_model"
)]
pub async fn get_stage(
    State(state): State<AppState>,
    Path((event_id, stage_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    let stage = services::get_stage(&state.db, event_id, stage_id).await?;

    Ok(Json(stage).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/stages",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreateStageRequest,
    responses(
        (status = 201, description = "Stage created", body = Stage),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Duplicate stage number")
    ),
    tag = "course_model"
)]
pub async fn create_stage(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreateStageRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let stage = services::create_stage(&state.db, event_id, &req).await?;

    Ok((StatusCode::CREATED, Json(stage)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/stages/{stage_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("stage_id" = i64, Path, description = "Stage id")
    ),
    request_body = UpdateStageRequest,
    responses(
        (status = 200, description = "Stage updated", body = Stage),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Stage not found"),
        (status = 409, description = "Duplicate stage number")
    ),
    tag = "course_model"
)]
pub async fn update_stage(
    State(state): State<AppState>,
    Path((event_id, stage_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let stage = services::update_stage(&state.db, event_id, stage_id, &req).await?;

    Ok(Json(stage).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/stages/{stage_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("stage_id" = i64, Path, description = "Stage id")
    ),
    responses(
        (status = 204, description = "Stage deleted"),
        (status = 404, description = "Stage not found")
    ),
    tag = "course_model"
)]
pub async fn delete_stage(
    State(state): State<AppState>,
    Path((event_id, stage_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_stage(&state.db, event_id, stage_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/courses",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Courses of the event", body = Vec<CourseResponse>),
        (status = 404, description = "Event not found")
    ),
    tag = "course_model"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let courses = services::list_courses(&state.db, event_id).await?;

    Ok(Json(courses).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/courses/{course_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("course_id" = i64, Path, description = "Course id")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseResponse),
        (status = 404, description = "Course not found")
    ),
    tag = "course_model"
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path((event_id, course_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    let course = services::get_course(&state.db, event_id, course_id).await?;

    Ok(Json(course).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/courses",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "course_model"
)]
pub async fn create_course(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let course = services::create_course(&state.db, event_id, &req).await?;

    Ok((StatusCode::CREATED, Json(course)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/courses/{course_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("course_id" = i64, Path, description = "Course id")
    ),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "course_model"
)]
pub async fn update_course(
    State(state): State<AppState>,
    Path((event_id, course_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let course = services::update_course(&state.db, event_id, course_id, &req).await?;

    Ok(Json(course).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/courses/{course_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("course_id" = i64, Path, description = "Course id")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Course is used by a class")
    ),
    tag = "course_model"
)]
pub async fn delete_course(
    State(state): State<AppState>,
    Path((event_id, course_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_course(&state.db, event_id, course_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/courses/{course_id}/stages",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("course_id" = i64, Path, description = "Course id")
    ),
    request_body = SetCourseStagesRequest,
    responses(
        (status = 200, description = "Stage membership replaced", body = CourseResponse),
        (status = 400, description = "Unknown stage"),
        (status = 404, description = "Course not found")
    ),
    tag = "course_model"
)]
pub async fn set_course_stages(
    State(state): State<AppState>,
    Path((event_id, course_id)): Path<(i64, i64)>,
    Json(req): Json<SetCourseStagesRequest>,
) -> Result<Response, WebError> {
    let course = services::set_course_stages(&state.db, event_id, course_id, &req).await?;

    Ok(Json(course).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/classes",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Classs of the event", body = Vec<Class>),
        (status = 404, description = "Event not found")
    ),
    tag = "course_model"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Response, WebError> {
    let classes = services::list_classes(&state.db, event_id).await?;

    Ok(Json(classes).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/classes/{class_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    responses(
        (status = 200, description = "Class found", body = Class),
        (status = 404, description = "Class not found")
    ),
    tag = "course_model"
)]
pub async fn get_class(
    State(state): State<AppState>,
    Path((event_id, class_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    let class = services::get_class(&state.db, event_id, class_id).await?;

    Ok(Json(class).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/classes",
    params(
        ("event_id" = i64, Path, description = "Event id")
    ),
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "course_model"
)]
pub async fn create_class(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<CreateClassRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let class = services::create_class(&state.db, event_id, &req).await?;

    Ok((StatusCode::CREATED, Json(class)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/classes/{class_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Duplicate name")
    ),
    tag = "course_model"
)]
pub async fn update_class(
    State(state): State<AppState>,
    Path((event_id, class_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateClassRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let class = services::update_class(&state.db, event_id, class_id, &req).await?;

    Ok(Json(class).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/classes/{class_id}",
    params(
        ("event_id" = i64, Path, description = "Event id"),
        ("class_id" = i64, Path, description = "Class id")
    ),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 404, description = "Class not found")
    ),
    tag = "course_model"
)]
pub async fn delete_class(
    State(state): State<AppState>,
    Path((event_id, class_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    services::delete_class(&state.db, event_id, class_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
