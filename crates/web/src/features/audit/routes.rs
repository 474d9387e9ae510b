use axum::{Router, routing::get};

use super::handlers::list_audit;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/audit", get(list_audit))
}
