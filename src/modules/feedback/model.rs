use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Open,
    Planned,
    InProgress,
    Resolved,
    Declined,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Open => "open",
            FeedbackStatus::Planned => "planned",
            FeedbackStatus::InProgress => "in_progress",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Declined => "declined",
        }
    }

    /// Status as it reads in an email body.
    pub fn display(&self) -> &'static str {
        match self {
            FeedbackStatus::InProgress => "in progress",
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Feedback {
    pub id: Uuid,
    /// None once the submitter's account has been deleted.
    pub user_id: Option<Uuid>,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin list row with the submitter attached when they still exist.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeedbackWithAuthor {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFeedbackDto {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Subject must be between 1 and 200 characters"
    ))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Body must be between 1 and 5000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFeedbackStatusDto {
    pub status: FeedbackStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackFilterParams {
    pub status: Option<FeedbackStatus>,

    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedFeedbackResponse {
    pub data: Vec<FeedbackWithAuthor>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_from_snake_case() {
        let status: FeedbackStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status, FeedbackStatus::InProgress);
        assert_eq!(status.display(), "in progress");
        assert!(serde_json::from_str::<FeedbackStatus>(r#""done""#).is_err());
    }

    #[test]
    fn create_dto_rejects_empty_subject() {
        let dto = CreateFeedbackDto {
            subject: String::new(),
            body: "The menu page takes forever to load.".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
