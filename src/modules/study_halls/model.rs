use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudyHall {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub room: Option<String>,
    pub capacity: i32,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A hall together with its live occupancy (open sessions right now).
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudyHallView {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub room: Option<String>,
    pub capacity: i32,
    pub is_open: bool,
    pub occupancy: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudyHallSession {
    pub id: Uuid,
    pub study_hall_id: Uuid,
    pub user_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStudyHallDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 50))]
    pub room: Option<String>,

    #[validate(range(min = 1, max = 500, message = "Capacity must be between 1 and 500"))]
    pub capacity: Option<i32>,

    pub is_open: Option<bool>,

    /// Defaults to the caller's school when omitted.
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStudyHallDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 50))]
    pub room: Option<String>,

    #[validate(range(min = 1, max = 500, message = "Capacity must be between 1 and 500"))]
    pub capacity: Option<i32>,

    pub is_open: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudyHallListParams {
    /// School override for accounts without one.
    pub school_id: Option<Uuid>,
}
