use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{
    activate_event, create_event, delete_event, finish_event, get_event, list_events,
    update_event,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:event_id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/:event_id/activate", post(activate_event))
        .route("/events/:event_id/finish", post(finish_event))
}
