use axum::{Router, routing::get};

use super::handlers::{create_punch, delete_punch, get_punch, list_punches};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/:event_id/punches",
            get(list_punches).post(create_punch),
        )
        .route(
            "/events/:event_id/punches/:punch_id",
            get(get_punch).delete(delete_punch),
        )
}
