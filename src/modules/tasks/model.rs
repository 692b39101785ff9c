use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A personal task. Owner-scoped; no sharing.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTaskDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TaskFilterParams {
    pub completed: Option<bool>,
    /// Only tasks due on or before this date.
    pub due_before: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedTasksResponse {
    pub data: Vec<Task>,
    pub meta: crate::utils::pagination::PaginationMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TaskExportQuery {
    pub format: Option<TaskExportFormat>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TaskImportQuery {
    pub format: Option<TaskExportFormat>,
}
