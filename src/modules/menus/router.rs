use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_menu_item, delete_menu_item, get_menu_day, import_menu, update_menu_item,
};

pub fn init_menus_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_menu_day).post(create_menu_item))
        .route("/import", post(import_menu))
        .route("/{id}", patch(update_menu_item).delete(delete_menu_item))
}
