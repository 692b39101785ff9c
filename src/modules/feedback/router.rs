use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{create_feedback, get_all_feedback, get_my_feedback, update_feedback_status};

pub fn init_feedback_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_feedback).post(create_feedback))
        .route("/all", get(get_all_feedback))
        .route("/{id}/status", patch(update_feedback_status))
}
