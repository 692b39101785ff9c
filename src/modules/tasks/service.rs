use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;
use crate::utils::transfer::{ImportReport, RowError};

use super::model::{
    CreateTaskDto, PaginatedTasksResponse, Task, TaskFilterParams, UpdateTaskDto,
};
use super::transfer::TaskRecord;

const TASK_COLUMNS: &str =
    "id, user_id, title, notes, due_date, completed, completed_at, created_at, updated_at";

pub struct TaskService;

impl TaskService {
    #[instrument(skip(db, dto))]
    pub async fn create_task(
        db: &PgPool,
        user_id: Uuid,
        dto: CreateTaskDto,
    ) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"INSERT INTO tasks (user_id, title, notes, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {TASK_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(&dto.title)
        .bind(&dto.notes)
        .bind(dto.due_date)
        .fetch_one(db)
        .await?;

        Ok(task)
    }

    #[instrument(skip(db))]
    pub async fn list_tasks(
        db: &PgPool,
        user_id: Uuid,
        params: TaskFilterParams,
    ) -> Result<PaginatedTasksResponse, AppError> {
        let limit = params.pagination.limit();
        let offset = params.pagination.offset();

        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = $1
              AND ($2::boolean IS NULL OR completed = $2)
              AND ($3::date IS NULL OR due_date <= $3)
            ORDER BY due_date NULLS LAST, created_at
            LIMIT $4 OFFSET $5"#
        ))
        .bind(user_id)
        .bind(params.completed)
        .bind(params.due_before)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM tasks
            WHERE user_id = $1
              AND ($2::boolean IS NULL OR completed = $2)
              AND ($3::date IS NULL OR due_date <= $3)"#,
        )
        .bind(user_id)
        .bind(params.completed)
        .bind(params.due_before)
        .fetch_one(db)
        .await?;

        let has_more = offset + (tasks.len() as i64) < total;

        let meta = PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        };

        Ok(PaginatedTasksResponse { data: tasks, meta })
    }

    #[instrument(skip(db))]
    pub async fn get_task(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Task, AppError> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Task with id {} not found", id)))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_task(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        dto: UpdateTaskDto,
    ) -> Result<Task, AppError> {
        sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks
            SET title = COALESCE($3, title),
                notes = COALESCE($4, notes),
                due_date = COALESCE($5, due_date),
                completed = COALESCE($6, completed),
                completed_at = CASE
                    WHEN $6::boolean IS TRUE AND completed = FALSE THEN NOW()
                    WHEN $6::boolean IS FALSE THEN NULL
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(dto.title)
        .bind(dto.notes)
        .bind(dto.due_date)
        .bind(dto.completed)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Task with id {} not found", id)))
    }

    #[instrument(skip(db))]
    pub async fn delete_task(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Task with id {} not found", id)));
        }

        Ok(())
    }

    /// Everything the user owns, in a stable order for export.
    #[instrument(skip(db))]
    pub async fn all_tasks(db: &PgPool, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = $1
            ORDER BY due_date NULLS LAST, created_at"#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(tasks)
    }

    /// Inserts already-validated records. All of them land or none do;
    /// row-level rejects were filtered before this point.
    #[instrument(skip(db, records, errors))]
    pub async fn import_tasks(
        db: &PgPool,
        user_id: Uuid,
        records: Vec<TaskRecord>,
        errors: Vec<RowError>,
    ) -> Result<ImportReport, AppError> {
        let mut tx = db.begin().await?;

        for record in &records {
            sqlx::query(
                r#"INSERT INTO tasks (user_id, title, notes, due_date, completed, completed_at)
                VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() ELSE NULL END)"#,
            )
            .bind(user_id)
            .bind(record.title.trim())
            .bind(&record.notes)
            .bind(record.due_date)
            .bind(record.completed)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            user_id = %user_id,
            imported = records.len(),
            rejected = errors.len(),
            "Imported tasks"
        );

        Ok(ImportReport::new(records.len(), errors))
    }
}
