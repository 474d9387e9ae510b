use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers::{
    create_chip, create_entry, delete_chip, delete_entry, get_entry, import_chips,
    import_chips_csv, import_entries, import_entries_csv, list_chips, list_entries, update_chip,
    update_entry,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/:event_id/entries",
            get(list_entries).post(create_entry),
        )
        .route("/events/:event_id/entries/import", post(import_entries))
        .route("/events/:event_id/entries/import/csv", post(import_entries_csv))
        .route(
            "/events/:event_id/entries/:entry_id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/events/:event_id/chips", get(list_chips).post(create_chip))
        .route("/events/:event_id/chips/import", post(import_chips))
        .route("/events/:event_id/chips/import/csv", post(import_chips_csv))
        .route(
            "/events/:event_id/chips/:chip_id",
            put(update_chip).delete(delete_chip),
        )
}
