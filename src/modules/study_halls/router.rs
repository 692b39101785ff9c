use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    check_in, check_out, create_study_hall, delete_study_hall, get_study_halls, update_study_hall,
};

pub fn init_study_halls_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_study_halls).post(create_study_hall))
        .route("/{id}", patch(update_study_hall).delete(delete_study_hall))
        .route("/{id}/check-in", post(check_in))
        .route("/{id}/check-out", post(check_out))
}
