use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{
    BragEntry, BragStatus, CreateBragEntryDto, PendingBragEntry, ReviewBragEntryDto,
    UpdateBragEntryDto,
};

const ENTRY_COLUMNS: &str = "id, user_id, category, title, description, occurred_on, hours, \
    status, verified_by, verified_at, review_note, created_at, updated_at";

pub struct BragSheetService;

impl BragSheetService {
    #[instrument(skip(db))]
    pub async fn list_entries(db: &PgPool, user_id: Uuid) -> Result<Vec<BragEntry>, AppError> {
        let entries = sqlx::query_as::<_, BragEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM brag_entries
             WHERE user_id = $1
             ORDER BY occurred_on DESC NULLS LAST, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(entries)
    }

    #[instrument(skip(db, dto))]
    pub async fn create_entry(
        db: &PgPool,
        user_id: Uuid,
        dto: CreateBragEntryDto,
    ) -> Result<BragEntry, AppError> {
        let entry = sqlx::query_as::<_, BragEntry>(&format!(
            r#"INSERT INTO brag_entries (user_id, category, title, description, occurred_on, hours)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(dto.category.as_str())
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.occurred_on)
        .bind(dto.hours)
        .fetch_one(db)
        .await?;

        Ok(entry)
    }

    /// Owner edit. Any edit sends the entry back through review: status
    /// returns to pending and the previous verdict is cleared.
    #[instrument(skip(db, dto))]
    pub async fn update_entry(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        dto: UpdateBragEntryDto,
    ) -> Result<BragEntry, AppError> {
        let entry = sqlx::query_as::<_, BragEntry>(&format!(
            r#"UPDATE brag_entries
            SET category = COALESCE($3, category),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                occurred_on = COALESCE($6, occurred_on),
                hours = COALESCE($7, hours),
                status = 'pending',
                verified_by = NULL,
                verified_at = NULL,
                review_note = NULL,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(dto.category.map(|c| c.as_str()))
        .bind(dto.title)
        .bind(dto.description)
        .bind(dto.occurred_on)
        .bind(dto.hours)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Brag entry with id {} not found", id)))?;

        Ok(entry)
    }

    #[instrument(skip(db))]
    pub async fn delete_entry(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM brag_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "Brag entry with id {} not found",
                id
            )));
        }

        Ok(())
    }

    /// The verification queue for one school, oldest first.
    #[instrument(skip(db))]
    pub async fn pending_entries(
        db: &PgPool,
        school_id: Uuid,
    ) -> Result<Vec<PendingBragEntry>, AppError> {
        let entries = sqlx::query_as::<_, PendingBragEntry>(
            r#"SELECT b.id, b.user_id, u.first_name, u.last_name, u.grade_level,
                b.category, b.title, b.description, b.occurred_on, b.hours, b.created_at
            FROM brag_entries b
            JOIN users u ON u.id = b.user_id
            WHERE b.status = 'pending' AND u.school_id = $1
            ORDER BY b.created_at"#,
        )
        .bind(school_id)
        .fetch_all(db)
        .await?;

        Ok(entries)
    }

    /// Records a verdict. The verifier must belong to the same school as the
    /// entry's student.
    #[instrument(skip(db, dto))]
    pub async fn review_entry(
        db: &PgPool,
        id: Uuid,
        verifier_id: Uuid,
        verifier_school_id: Option<Uuid>,
        verdict: BragStatus,
        dto: ReviewBragEntryDto,
    ) -> Result<BragEntry, AppError> {
        let student_school_id: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT u.school_id
            FROM brag_entries b
            JOIN users u ON u.id = b.user_id
            WHERE b.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Brag entry with id {} not found", id)))?;

        match (verifier_school_id, student_school_id) {
            (Some(verifier), Some(student)) if verifier == student => {}
            _ => {
                return Err(AppError::forbidden(anyhow!(
                    "You can only review entries from students at your school"
                )));
            }
        }

        let entry = sqlx::query_as::<_, BragEntry>(&format!(
            r#"UPDATE brag_entries
            SET status = $2,
                verified_by = $3,
                verified_at = NOW(),
                review_note = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(id)
        .bind(verdict.as_str())
        .bind(verifier_id)
        .bind(dto.review_note)
        .fetch_one(db)
        .await?;

        info!(
            entry_id = %id,
            verifier_id = %verifier_id,
            verdict = verdict.as_str(),
            "Brag entry reviewed"
        );

        Ok(entry)
    }
}
