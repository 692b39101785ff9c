use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    create_discussion, create_reply, delete_discussion, delete_reply, get_discussion,
    get_discussions, lock_discussion, unlock_discussion,
};

pub fn init_discussions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_discussions).post(create_discussion))
        .route("/{id}", get(get_discussion).delete(delete_discussion))
        .route("/{id}/replies", post(create_reply))
        .route("/{id}/replies/{reply_id}", delete(delete_reply))
        .route("/{id}/lock", post(lock_discussion))
        .route("/{id}/unlock", post(unlock_discussion))
}
