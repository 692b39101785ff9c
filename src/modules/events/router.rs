use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::events_feed;

pub fn init_events_router() -> Router<AppState> {
    Router::new().route("/", get(events_feed))
}
