use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::events::{ChangeEvent, EventBus, EventStream};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    CreateDiscussionDto, CreateReplyDto, Discussion, DiscussionFilterParams,
    DiscussionReply, DiscussionSummary, DiscussionThread, PaginatedDiscussionsResponse,
};

const DISCUSSION_COLUMNS: &str =
    "id, school_id, author_id, title, body, is_locked, created_at, updated_at";
const REPLY_COLUMNS: &str = "id, discussion_id, author_id, body, created_at";

fn publish_change(events: &EventBus, school_id: Uuid, discussion_id: Uuid) {
    events.publish(ChangeEvent {
        stream: EventStream::Discussions,
        school_id,
        entity_id: discussion_id,
    });
}

pub struct DiscussionService;

impl DiscussionService {
    #[instrument(skip(db, params))]
    pub async fn list_discussions(
        db: &PgPool,
        school_id: Uuid,
        params: DiscussionFilterParams,
    ) -> Result<PaginatedDiscussionsResponse, AppError> {
        let limit = params.pagination.limit();
        let offset = params.pagination.offset();

        let discussions = sqlx::query_as::<_, DiscussionSummary>(
            r#"SELECT d.id, d.school_id, d.author_id, d.title, d.is_locked,
                COUNT(r.id) AS reply_count, d.created_at, d.updated_at
            FROM discussions d
            LEFT JOIN discussion_replies r ON r.discussion_id = d.id
            WHERE d.school_id = $1
            GROUP BY d.id
            ORDER BY d.created_at DESC
            LIMIT $2 OFFSET $3"#,
        )
        .bind(school_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discussions WHERE school_id = $1")
            .bind(school_id)
            .fetch_one(db)
            .await?;

        let has_more = offset + (discussions.len() as i64) < total;

        let meta = PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        };

        Ok(PaginatedDiscussionsResponse {
            data: discussions,
            meta,
        })
    }

    #[instrument(skip(db, events, dto))]
    pub async fn create_discussion(
        db: &PgPool,
        events: &EventBus,
        dto: CreateDiscussionDto,
        author_id: Uuid,
        caller_school_id: Option<Uuid>,
    ) -> Result<Discussion, AppError> {
        let school_id = dto.school_id.or(caller_school_id).ok_or_else(|| {
            AppError::bad_request(anyhow!("No school specified and your account has none"))
        })?;

        let discussion = sqlx::query_as::<_, Discussion>(&format!(
            r#"INSERT INTO discussions (school_id, author_id, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {DISCUSSION_COLUMNS}"#
        ))
        .bind(school_id)
        .bind(author_id)
        .bind(&dto.title)
        .bind(&dto.body)
        .fetch_one(db)
        .await?;

        publish_change(events, discussion.school_id, discussion.id);

        Ok(discussion)
    }

    #[instrument(skip(db))]
    pub async fn get_thread(db: &PgPool, id: Uuid) -> Result<DiscussionThread, AppError> {
        let discussion = sqlx::query_as::<_, Discussion>(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Discussion with id {} not found", id)))?;

        let replies = sqlx::query_as::<_, DiscussionReply>(&format!(
            "SELECT {REPLY_COLUMNS} FROM discussion_replies
             WHERE discussion_id = $1 ORDER BY created_at"
        ))
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(DiscussionThread {
            discussion,
            replies,
        })
    }

    /// Replies land on unlocked threads only; a locked thread rejects
    /// everyone, moderators included, until it is unlocked.
    #[instrument(skip(db, events, dto))]
    pub async fn add_reply(
        db: &PgPool,
        events: &EventBus,
        discussion_id: Uuid,
        author_id: Uuid,
        dto: CreateReplyDto,
    ) -> Result<DiscussionReply, AppError> {
        let discussion = sqlx::query_as::<_, Discussion>(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE id = $1"
        ))
        .bind(discussion_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::not_found(anyhow!("Discussion with id {} not found", discussion_id))
        })?;

        if discussion.is_locked {
            return Err(AppError::bad_request(anyhow!(
                "This discussion is locked"
            )));
        }

        let reply = sqlx::query_as::<_, DiscussionReply>(&format!(
            r#"INSERT INTO discussion_replies (discussion_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING {REPLY_COLUMNS}"#
        ))
        .bind(discussion_id)
        .bind(author_id)
        .bind(&dto.body)
        .fetch_one(db)
        .await?;

        publish_change(events, discussion.school_id, discussion_id);

        Ok(reply)
    }

    #[instrument(skip(db, events))]
    pub async fn delete_discussion(
        db: &PgPool,
        events: &EventBus,
        id: Uuid,
        caller_id: Uuid,
        can_moderate: bool,
    ) -> Result<(), AppError> {
        let discussion = sqlx::query_as::<_, Discussion>(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Discussion with id {} not found", id)))?;

        if discussion.author_id != Some(caller_id) && !can_moderate {
            return Err(AppError::forbidden(anyhow!(
                "You can only delete your own discussions"
            )));
        }

        sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        publish_change(events, discussion.school_id, id);

        Ok(())
    }

    #[instrument(skip(db, events))]
    pub async fn delete_reply(
        db: &PgPool,
        events: &EventBus,
        discussion_id: Uuid,
        reply_id: Uuid,
        caller_id: Uuid,
        can_moderate: bool,
    ) -> Result<(), AppError> {
        let row: Option<(Option<Uuid>, Uuid)> = sqlx::query_as(
            r#"SELECT r.author_id, d.school_id
            FROM discussion_replies r
            JOIN discussions d ON d.id = r.discussion_id
            WHERE r.id = $1 AND r.discussion_id = $2"#,
        )
        .bind(reply_id)
        .bind(discussion_id)
        .fetch_optional(db)
        .await?;

        let (author_id, school_id) = row.ok_or_else(|| {
            AppError::not_found(anyhow!("Reply with id {} not found", reply_id))
        })?;

        if author_id != Some(caller_id) && !can_moderate {
            return Err(AppError::forbidden(anyhow!(
                "You can only delete your own replies"
            )));
        }

        sqlx::query("DELETE FROM discussion_replies WHERE id = $1")
            .bind(reply_id)
            .execute(db)
            .await?;

        publish_change(events, school_id, discussion_id);

        Ok(())
    }

    #[instrument(skip(db, events))]
    pub async fn set_locked(
        db: &PgPool,
        events: &EventBus,
        id: Uuid,
        locked: bool,
    ) -> Result<Discussion, AppError> {
        let discussion = sqlx::query_as::<_, Discussion>(&format!(
            r#"UPDATE discussions
            SET is_locked = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {DISCUSSION_COLUMNS}"#
        ))
        .bind(id)
        .bind(locked)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Discussion with id {} not found", id)))?;

        publish_change(events, discussion.school_id, discussion.id);

        Ok(discussion)
    }
}
