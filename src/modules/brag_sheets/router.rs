use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_entry, delete_entry, get_my_entries, get_pending_entries, reject_entry, update_entry,
    verify_entry,
};

pub fn init_brag_sheet_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_entries).post(create_entry))
        .route("/pending", get(get_pending_entries))
        .route("/{id}", patch(update_entry).delete(delete_entry))
        .route("/{id}/verify", post(verify_entry))
        .route("/{id}/reject", post(reject_entry))
}
