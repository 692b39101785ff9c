use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GradeCount {
    /// None groups users with no grade set.
    pub grade_level: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HallOccupancy {
    pub study_hall_id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub occupancy: i64,
}

/// One school's dashboard numbers.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsOverview {
    pub school_id: Uuid,
    pub users_by_grade: Vec<GradeCount>,
    pub tasks_created_30d: i64,
    pub tasks_completed_30d: i64,
    pub open_discussions: i64,
    pub pending_brag_entries: i64,
    pub study_hall_occupancy: Vec<HallOccupancy>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyticsParams {
    /// School override for accounts without one.
    pub school_id: Option<Uuid>,
}
