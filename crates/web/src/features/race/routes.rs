use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{
    freeze_standings, get_race_state, pause_ingest, post_highlight, post_stage_status, recompute,
    resume_ingest, unfreeze_standings,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/:event_id/race-state", get(get_race_state))
        .route("/events/:event_id/ingest/pause", post(pause_ingest))
        .route("/events/:event_id/ingest/resume", post(resume_ingest))
        .route("/events/:event_id/standings/freeze", post(freeze_standings))
        .route("/events/:event_id/standings/unfreeze", post(unfreeze_standings))
        .route("/events/:event_id/recompute", post(recompute))
        .route("/events/:event_id/highlights", post(post_highlight))
        .route(
            "/events/:event_id/stages/:stage_id/status",
            post(post_stage_status),
        )
}
