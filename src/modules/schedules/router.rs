use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_entry, delete_entry, export_entries, get_entries, import_entries, update_entry,
};

pub fn init_schedules_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_entry).get(get_entries))
        .route("/export", get(export_entries))
        .route("/import", post(import_entries))
        .route("/{id}", patch(update_entry).delete(delete_entry))
}
