use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{create_backup, list_backups, restore_backup};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/backups", get(list_backups).post(create_backup))
        .route("/backups/restore", post(restore_backup))
}
