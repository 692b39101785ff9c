use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{AnalyticsOverview, GradeCount, HallOccupancy};

pub struct AnalyticsService;

impl AnalyticsService {
    #[instrument(skip(db))]
    pub async fn overview(db: &PgPool, school_id: Uuid) -> Result<AnalyticsOverview, AppError> {
        let users_by_grade = sqlx::query_as::<_, GradeCount>(
            r#"SELECT grade_level, COUNT(*) AS count
            FROM users
            WHERE school_id = $1
            GROUP BY grade_level
            ORDER BY grade_level NULLS LAST"#,
        )
        .bind(school_id)
        .fetch_all(db)
        .await?;

        let tasks_created_30d: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM tasks t
            JOIN users u ON u.id = t.user_id
            WHERE u.school_id = $1 AND t.created_at >= NOW() - INTERVAL '30 days'"#,
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        let tasks_completed_30d: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM tasks t
            JOIN users u ON u.id = t.user_id
            WHERE u.school_id = $1 AND t.completed_at >= NOW() - INTERVAL '30 days'"#,
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        let open_discussions: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM discussions WHERE school_id = $1 AND is_locked = FALSE",
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        let pending_brag_entries: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM brag_entries b
            JOIN users u ON u.id = b.user_id
            WHERE b.status = 'pending' AND u.school_id = $1"#,
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        let study_hall_occupancy = sqlx::query_as::<_, HallOccupancy>(
            r#"SELECT h.id AS study_hall_id, h.name, h.capacity, COUNT(s.id) AS occupancy
            FROM study_halls h
            LEFT JOIN study_hall_sessions s
                ON s.study_hall_id = h.id AND s.checked_out_at IS NULL
            WHERE h.school_id = $1
            GROUP BY h.id
            ORDER BY h.name"#,
        )
        .bind(school_id)
        .fetch_all(db)
        .await?;

        Ok(AnalyticsOverview {
            school_id,
            users_by_grade,
            tasks_created_30d,
            tasks_completed_30d,
            open_discussions,
            pending_brag_entries,
            study_hall_occupancy,
        })
    }
}
