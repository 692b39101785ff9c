use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One recurring class block. `weekday` is ISO numbering, 1 = Monday
/// through 7 = Sunday.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub period: Option<i32>,
    pub weekday: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub room: Option<String>,
    pub instructor: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateScheduleEntryDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0, max = 20))]
    pub period: Option<i32>,
    #[validate(range(min = 1, max = 7))]
    pub weekday: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[validate(length(max = 100))]
    pub room: Option<String>,
    #[validate(length(max = 100))]
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateScheduleEntryDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 0, max = 20))]
    pub period: Option<i32>,
    #[validate(range(min = 1, max = 7))]
    pub weekday: Option<i16>,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
    #[validate(length(max = 100))]
    pub room: Option<String>,
    #[validate(length(max = 100))]
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleExportFormat {
    Ics,
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleExportQuery {
    pub format: Option<ScheduleExportFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleImportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleImportQuery {
    pub format: Option<ScheduleImportFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn create_dto_rejects_out_of_range_weekday() {
        let dto = CreateScheduleEntryDto {
            title: "AP Biology".to_string(),
            period: Some(2),
            weekday: 8,
            starts_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(9, 50, 0).unwrap(),
            room: None,
            instructor: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateScheduleEntryDto { weekday: 3, ..dto };
        assert!(dto.validate().is_ok());
    }
}
