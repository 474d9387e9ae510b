use axum::{Router, routing::get};

use super::handlers::{get_stage_results, get_standings};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/:event_id/stages/:stage_id/results",
            get(get_stage_results),
        )
        .route("/events/:event_id/standings", get(get_standings))
}
