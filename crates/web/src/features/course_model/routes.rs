use axum::{
    Router,
    routing::{get, put},
};

use super::handlers::{
    create_class, create_control, create_course, create_stage, delete_class, delete_control,
    delete_course, delete_stage, get_class, get_control, get_course, get_stage, list_classes,
    list_controls, list_courses, list_stages, set_course_stages, update_class, update_control,
    update_course, update_stage,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/:event_id/controls",
            get(list_controls).post(create_control),
        )
        .route(
            "/events/:event_id/controls/:control_id",
            get(get_control).put(update_control).delete(delete_control),
        )
        .route("/events/:event_id/stages", get(list_stages).post(create_stage))
        .route(
            "/events/:event_id/stages/:stage_id",
            get(get_stage).put(update_stage).delete(delete_stage),
        )
        .route(
            "/events/:event_id/courses",
            get(list_courses).post(create_course),
        )
        .route(
            "/events/:event_id/courses/:course_id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route(
            "/events/:event_id/courses/:course_id/stages",
            put(set_course_stages),
        )
        .route(
            "/events/:event_id/classes",
            get(list_classes).post(create_class),
        )
        .route(
            "/events/:event_id/classes/:class_id",
            get(get_class).put(update_class).delete(delete_class),
        )
}
