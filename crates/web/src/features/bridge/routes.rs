use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{configure, get_status, start, stop};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/:event_id/bridge", get(get_status))
        .route("/events/:event_id/bridge/configure", post(configure))
        .route("/events/:event_id/bridge/start", post(start))
        .route("/events/:event_id/bridge/stop", post(stop))
}
