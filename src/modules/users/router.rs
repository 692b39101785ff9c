use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    delete_my_account, delete_user, get_my_permissions, get_my_profile, get_user, get_users,
    update_my_profile, update_user,
};

/// Mounted at `/me`.
pub fn init_profile_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_my_profile)
                .patch(update_my_profile)
                .delete(delete_my_account),
        )
        .route("/permissions", get(get_my_permissions))
}

/// Mounted at `/users`. Role assignment routes nest separately under
/// `/users/{user_id}/roles`.
pub fn init_users_router() -> Router<AppState> {
    Router::new().route("/", get(get_users)).route(
        "/{id}",
        get(get_user).patch(update_user).delete(delete_user),
    )
}
