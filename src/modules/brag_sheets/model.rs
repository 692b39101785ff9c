use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// What kind of accomplishment an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BragCategory {
    Award,
    Activity,
    Service,
    Athletics,
    Academics,
    Other,
}

impl BragCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BragCategory::Award => "award",
            BragCategory::Activity => "activity",
            BragCategory::Service => "service",
            BragCategory::Athletics => "athletics",
            BragCategory::Academics => "academics",
            BragCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BragStatus {
    Pending,
    Verified,
    Rejected,
}

impl BragStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BragStatus::Pending => "pending",
            BragStatus::Verified => "verified",
            BragStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BragEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub hours: Option<f32>,
    pub status: String,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A pending entry as the verification queue shows it, with the student
/// attached.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PendingBragEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: Option<String>,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub hours: Option<f32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBragEntryDto {
    pub category: BragCategory,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub occurred_on: Option<NaiveDate>,

    #[validate(range(min = 0.0, max = 10000.0, message = "Hours must be between 0 and 10000"))]
    pub hours: Option<f32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBragEntryDto {
    pub category: Option<BragCategory>,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub occurred_on: Option<NaiveDate>,

    #[validate(range(min = 0.0, max = 10000.0, message = "Hours must be between 0 and 10000"))]
    pub hours: Option<f32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewBragEntryDto {
    #[validate(length(max = 1000))]
    pub review_note: Option<String>,
}
