use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    CreateFeedbackDto, Feedback, FeedbackFilterParams, FeedbackStatus, FeedbackWithAuthor,
    PaginatedFeedbackResponse,
};

const FEEDBACK_COLUMNS: &str = "id, user_id, subject, body, status, created_at, updated_at";

pub struct FeedbackService;

impl FeedbackService {
    #[instrument(skip(db, dto))]
    pub async fn create_feedback(
        db: &PgPool,
        user_id: Uuid,
        dto: CreateFeedbackDto,
    ) -> Result<Feedback, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            r#"INSERT INTO feedback (user_id, subject, body)
            VALUES ($1, $2, $3)
            RETURNING {FEEDBACK_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(&dto.subject)
        .bind(&dto.body)
        .fetch_one(db)
        .await?;

        Ok(feedback)
    }

    #[instrument(skip(db))]
    pub async fn list_my_feedback(db: &PgPool, user_id: Uuid) -> Result<Vec<Feedback>, AppError> {
        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(feedback)
    }

    #[instrument(skip(db, params))]
    pub async fn list_all_feedback(
        db: &PgPool,
        params: FeedbackFilterParams,
    ) -> Result<PaginatedFeedbackResponse, AppError> {
        let limit = params.pagination.limit();
        let offset = params.pagination.offset();
        let status = params.status.map(|s| s.as_str());

        let feedback = sqlx::query_as::<_, FeedbackWithAuthor>(
            r#"SELECT f.id, f.user_id, u.first_name, u.last_name, u.email,
                f.subject, f.body, f.status, f.created_at, f.updated_at
            FROM feedback f
            LEFT JOIN users u ON u.id = f.user_id
            WHERE ($1::text IS NULL OR f.status = $1)
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3"#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM feedback WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(db)
        .await?;

        let has_more = offset + (feedback.len() as i64) < total;

        let meta = PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        };

        Ok(PaginatedFeedbackResponse {
            data: feedback,
            meta,
        })
    }

    /// Moves feedback to a new status and tells the submitter, best effort.
    /// Setting the status it already has is a no-op without an email.
    #[instrument(skip(db, email))]
    pub async fn update_status(
        db: &PgPool,
        email: &EmailService,
        id: Uuid,
        status: FeedbackStatus,
    ) -> Result<Feedback, AppError> {
        let current_status: String = sqlx::query_scalar("SELECT status FROM feedback WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Feedback with id {} not found", id)))?;

        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            r#"UPDATE feedback
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {FEEDBACK_COLUMNS}"#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(db)
        .await?;

        if current_status != status.as_str() {
            if let Some(user_id) = feedback.user_id {
                let author: Option<(String, String)> =
                    sqlx::query_as("SELECT first_name, email FROM users WHERE id = $1")
                        .bind(user_id)
                        .fetch_optional(db)
                        .await?;

                if let Some((first_name, to_email)) = author {
                    if let Err(e) = email
                        .send_feedback_status_email(
                            &to_email,
                            &first_name,
                            &feedback.subject,
                            status.display(),
                        )
                        .await
                    {
                        warn!(error = %e.error, feedback_id = %id, "Failed to send feedback status email");
                    }
                }
            }
        }

        Ok(feedback)
    }
}
