use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Discussion {
    pub id: Uuid,
    pub school_id: Uuid,
    /// None once the author's account has been deleted.
    pub author_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List-view row: no body, but a live reply count.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DiscussionSummary {
    pub id: Uuid,
    pub school_id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub is_locked: bool,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DiscussionReply {
    pub id: Uuid,
    pub discussion_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscussionThread {
    pub discussion: Discussion,
    pub replies: Vec<DiscussionReply>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDiscussionDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Body must be between 1 and 10000 characters"))]
    pub body: String,

    /// Defaults to the caller's school when omitted.
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReplyDto {
    #[validate(length(min = 1, max = 10000, message = "Body must be between 1 and 10000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DiscussionFilterParams {
    /// School override for accounts without one.
    pub school_id: Option<Uuid>,

    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedDiscussionsResponse {
    pub data: Vec<DiscussionSummary>,
    pub meta: PaginationMeta,
}
