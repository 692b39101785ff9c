use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::chat;

pub fn init_chat_router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}
