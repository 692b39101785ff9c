use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_task, delete_task, export_tasks, get_task, get_tasks, import_tasks, update_task,
};

pub fn init_tasks_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task).get(get_tasks))
        .route("/export", get(export_tasks))
        .route("/import", post(import_tasks))
        .route(
            "/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}
