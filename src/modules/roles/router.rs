use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    assign_role_to_user, create_custom_role, delete_custom_role, get_custom_role_by_id,
    get_custom_roles, get_permissions, get_user_role_assignments, remove_role_from_user,
    update_custom_role,
};

pub fn init_roles_router() -> Router<AppState> {
    Router::new()
        .route("/permissions", get(get_permissions))
        .route("/custom", post(create_custom_role).get(get_custom_roles))
        .route(
            "/custom/{id}",
            get(get_custom_role_by_id)
                .patch(update_custom_role)
                .delete(delete_custom_role),
        )
}

/// Nested under `/users/{user_id}/roles`.
pub fn init_user_roles_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_user_role_assignments).post(assign_role_to_user))
        .route("/{assignment_id}", axum::routing::delete(remove_role_from_user))
}
