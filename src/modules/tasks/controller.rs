use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::transfer::ImportReport;
use crate::validator::ValidatedJson;

use super::model::{
    CreateTaskDto, PaginatedTasksResponse, Task, TaskExportFormat, TaskExportQuery,
    TaskFilterParams, TaskImportQuery, UpdateTaskDto,
};
use super::service::TaskService;
use super::transfer;

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskDto,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateTaskDto>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = TaskService::create_task(&state.db, auth_user.user_id()?, dto).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("completed" = Option<bool>, Query, description = "Filter by completion"),
        ("due_before" = Option<String>, Query, description = "Only tasks due on or before this date"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("offset" = Option<i64>, Query, description = "Offset into the result set")
    ),
    responses(
        (status = 200, description = "The caller's tasks", body = PaginatedTasksResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<TaskFilterParams>,
) -> Result<Json<PaginatedTasksResponse>, AppError> {
    let tasks = TaskService::list_tasks(&state.db, auth_user.user_id()?, params).await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let task = TaskService::get_task(&state.db, auth_user.user_id()?, id).await?;

    Ok(Json(task))
}

#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskDto,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTaskDto>,
) -> Result<Json<Task>, AppError> {
    let task = TaskService::update_task(&state.db, auth_user.user_id()?, id, dto).await?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TaskService::delete_task(&state.db, auth_user.user_id()?, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/tasks/export",
    params(("format" = Option<String>, Query, description = "json (default) or csv")),
    responses(
        (status = 200, description = "Task export as a download"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn export_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<TaskExportQuery>,
) -> Result<Response, AppError> {
    let tasks = TaskService::all_tasks(&state.db, auth_user.user_id()?).await?;

    let (content_type, filename, body) = match query.format.unwrap_or(TaskExportFormat::Json) {
        TaskExportFormat::Json => ("application/json", "tasks.json", transfer::to_json(&tasks)?),
        TaskExportFormat::Csv => ("text/csv", "tasks.csv", transfer::to_csv(&tasks)?),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/tasks/import",
    request_body(content = String, description = "A version-1 task export, JSON or CSV"),
    params(("format" = Option<String>, Query, description = "json (default) or csv")),
    responses(
        (status = 200, description = "Import report with per-row errors", body = ImportReport),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Tasks",
    security(("bearer_auth" = []))
)]
pub async fn import_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<TaskImportQuery>,
    body: String,
) -> Result<Json<ImportReport>, AppError> {
    let (records, errors) = match query.format.unwrap_or(TaskExportFormat::Json) {
        TaskExportFormat::Json => transfer::parse_json(&body)?,
        TaskExportFormat::Csv => transfer::parse_csv(&body)?,
    };

    let report = TaskService::import_tasks(&state.db, auth_user.user_id()?, records, errors).await?;

    Ok(Json(report))
}
