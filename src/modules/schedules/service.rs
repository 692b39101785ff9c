use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::transfer::{ImportReport, RowError};

use super::model::{CreateScheduleEntryDto, ScheduleEntry, UpdateScheduleEntryDto};
use super::transfer::ScheduleRecord;

const ENTRY_COLUMNS: &str = "id, user_id, title, period, weekday, starts_at, ends_at, room, \
     instructor, created_at, updated_at";

pub struct ScheduleService;

impl ScheduleService {
    #[instrument(skip(db, dto))]
    pub async fn create_entry(
        db: &PgPool,
        user_id: Uuid,
        dto: CreateScheduleEntryDto,
    ) -> Result<ScheduleEntry, AppError> {
        if dto.ends_at <= dto.starts_at {
            return Err(AppError::bad_request(anyhow!(
                "ends_at must be after starts_at"
            )));
        }

        let entry = sqlx::query_as::<_, ScheduleEntry>(&format!(
            r#"INSERT INTO schedule_entries
                (user_id, title, period, weekday, starts_at, ends_at, room, instructor)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(&dto.title)
        .bind(dto.period)
        .bind(dto.weekday)
        .bind(dto.starts_at)
        .bind(dto.ends_at)
        .bind(&dto.room)
        .bind(&dto.instructor)
        .fetch_one(db)
        .await?;

        Ok(entry)
    }

    /// The full week, ordered for display.
    #[instrument(skip(db))]
    pub async fn list_entries(db: &PgPool, user_id: Uuid) -> Result<Vec<ScheduleEntry>, AppError> {
        let entries = sqlx::query_as::<_, ScheduleEntry>(&format!(
            r#"SELECT {ENTRY_COLUMNS} FROM schedule_entries
            WHERE user_id = $1
            ORDER BY weekday, starts_at"#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(entries)
    }

    #[instrument(skip(db))]
    pub async fn get_entry(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<ScheduleEntry, AppError> {
        sqlx::query_as::<_, ScheduleEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM schedule_entries WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Schedule entry with id {} not found", id)))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_entry(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        dto: UpdateScheduleEntryDto,
    ) -> Result<ScheduleEntry, AppError> {
        let current = Self::get_entry(db, user_id, id).await?;

        let starts_at = dto.starts_at.unwrap_or(current.starts_at);
        let ends_at = dto.ends_at.unwrap_or(current.ends_at);
        if ends_at <= starts_at {
            return Err(AppError::bad_request(anyhow!(
                "ends_at must be after starts_at"
            )));
        }

        let entry = sqlx::query_as::<_, ScheduleEntry>(&format!(
            r#"UPDATE schedule_entries
            SET title = COALESCE($3, title),
                period = COALESCE($4, period),
                weekday = COALESCE($5, weekday),
                starts_at = $6,
                ends_at = $7,
                room = COALESCE($8, room),
                instructor = COALESCE($9, instructor),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(dto.title)
        .bind(dto.period)
        .bind(dto.weekday)
        .bind(starts_at)
        .bind(ends_at)
        .bind(dto.room)
        .bind(dto.instructor)
        .fetch_one(db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(db))]
    pub async fn delete_entry(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schedule_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "Schedule entry with id {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Inserts already-validated records transactionally.
    #[instrument(skip(db, records, errors))]
    pub async fn import_entries(
        db: &PgPool,
        user_id: Uuid,
        records: Vec<ScheduleRecord>,
        errors: Vec<RowError>,
    ) -> Result<ImportReport, AppError> {
        let mut tx = db.begin().await?;

        for record in &records {
            sqlx::query(
                r#"INSERT INTO schedule_entries
                    (user_id, title, period, weekday, starts_at, ends_at, room, instructor)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
            )
            .bind(user_id)
            .bind(record.title.trim())
            .bind(record.period)
            .bind(record.weekday)
            .bind(record.starts_at)
            .bind(record.ends_at)
            .bind(&record.room)
            .bind(&record.instructor)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            user_id = %user_id,
            imported = records.len(),
            rejected = errors.len(),
            "Imported schedule entries"
        );

        Ok(ImportReport::new(records.len(), errors))
    }
}
