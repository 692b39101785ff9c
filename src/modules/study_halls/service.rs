use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::events::{ChangeEvent, EventBus, EventStream};
use crate::metrics;
use crate::utils::errors::AppError;

use super::model::{
    CreateStudyHallDto, StudyHall, StudyHallSession, StudyHallView, UpdateStudyHallDto,
};

const HALL_COLUMNS: &str = "id, school_id, name, room, capacity, is_open, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, study_hall_id, user_id, checked_in_at, checked_out_at";

const DEFAULT_CAPACITY: i32 = 30;

async fn open_session_count(db: &PgPool, hall_id: Uuid) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM study_hall_sessions
         WHERE study_hall_id = $1 AND checked_out_at IS NULL",
    )
    .bind(hall_id)
    .fetch_one(db)
    .await?;

    Ok(count)
}

fn publish_change(events: &EventBus, school_id: Uuid, hall_id: Uuid) {
    events.publish(ChangeEvent {
        stream: EventStream::StudyHalls,
        school_id,
        entity_id: hall_id,
    });
}

pub struct StudyHallService;

impl StudyHallService {
    /// Lists a school's halls with their live occupancy.
    #[instrument(skip(db))]
    pub async fn list_halls(db: &PgPool, school_id: Uuid) -> Result<Vec<StudyHallView>, AppError> {
        let halls = sqlx::query_as::<_, StudyHallView>(
            r#"SELECT h.id, h.school_id, h.name, h.room, h.capacity, h.is_open,
                COUNT(s.id) AS occupancy, h.created_at, h.updated_at
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

        Ok(halls)
    }

    #[instrument(skip(db, events, dto))]
    pub async fn create_hall(
        db: &PgPool,
        events: &EventBus,
        dto: CreateStudyHallDto,
        caller_school_id: Option<Uuid>,
    ) -> Result<StudyHall, AppError> {
        let school_id = dto.school_id.or(caller_school_id).ok_or_else(|| {
            AppError::bad_request(anyhow!("No school specified and your account has none"))
        })?;

        let hall = sqlx::query_as::<_, StudyHall>(&format!(
            r#"INSERT INTO study_halls (school_id, name, room, capacity, is_open)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {HALL_COLUMNS}"#
        ))
        .bind(school_id)
        .bind(&dto.name)
        .bind(&dto.room)
        .bind(dto.capacity.unwrap_or(DEFAULT_CAPACITY))
        .bind(dto.is_open.unwrap_or(true))
        .fetch_one(db)
        .await?;

        publish_change(events, hall.school_id, hall.id);

        Ok(hall)
    }

    #[instrument(skip(db, events, dto))]
    pub async fn update_hall(
        db: &PgPool,
        events: &EventBus,
        id: Uuid,
        dto: UpdateStudyHallDto,
    ) -> Result<StudyHall, AppError> {
        let hall = sqlx::query_as::<_, StudyHall>(&format!(
            r#"UPDATE study_halls
            SET name = COALESCE($2, name),
                room = COALESCE($3, room),
                capacity = COALESCE($4, capacity),
                is_open = COALESCE($5, is_open),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {HALL_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.name)
        .bind(dto.room)
        .bind(dto.capacity)
        .bind(dto.is_open)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Study hall with id {} not found", id)))?;

        publish_change(events, hall.school_id, hall.id);

        Ok(hall)
    }

    /// Deleting a hall cascades its sessions away, so occupancy drops to
    /// zero along with it.
    #[instrument(skip(db, events))]
    pub async fn delete_hall(db: &PgPool, events: &EventBus, id: Uuid) -> Result<(), AppError> {
        let school_id: Uuid =
            sqlx::query_scalar("DELETE FROM study_halls WHERE id = $1 RETURNING school_id")
                .bind(id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(anyhow!("Study hall with id {} not found", id))
                })?;

        metrics::set_study_hall_occupancy(&id.to_string(), 0);
        publish_change(events, school_id, id);

        Ok(())
    }

    /// Opens a session in the hall. The capacity check rides inside the
    /// insert so two concurrent check-ins cannot both squeeze into the last
    /// seat, and the partial unique index on open sessions enforces one
    /// hall per user.
    #[instrument(skip(db, events))]
    pub async fn check_in(
        db: &PgPool,
        events: &EventBus,
        hall_id: Uuid,
        user_id: Uuid,
    ) -> Result<StudyHallSession, AppError> {
        let hall = sqlx::query_as::<_, StudyHall>(&format!(
            "SELECT {HALL_COLUMNS} FROM study_halls WHERE id = $1"
        ))
        .bind(hall_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Study hall with id {} not found", hall_id)))?;

        if !hall.is_open {
            return Err(AppError::bad_request(anyhow!(
                "{} is closed right now",
                hall.name
            )));
        }

        let session = sqlx::query_as::<_, StudyHallSession>(&format!(
            r#"INSERT INTO study_hall_sessions (study_hall_id, user_id)
            SELECT $1, $2
            WHERE (SELECT COUNT(*) FROM study_hall_sessions
                   WHERE study_hall_id = $1 AND checked_out_at IS NULL) < $3
            RETURNING {SESSION_COLUMNS}"#
        ))
        .bind(hall_id)
        .bind(user_id)
        .bind(hall.capacity)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!(
                        "You are already checked in to a study hall"
                    ));
                }
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::bad_request(anyhow!("{} is full", hall.name)))?;

        let occupancy = open_session_count(db, hall_id).await?;
        metrics::set_study_hall_occupancy(&hall_id.to_string(), occupancy);
        publish_change(events, hall.school_id, hall_id);

        info!(
            hall_id = %hall_id,
            user_id = %user_id,
            occupancy,
            "Checked in to study hall"
        );

        Ok(session)
    }

    #[instrument(skip(db, events))]
    pub async fn check_out(
        db: &PgPool,
        events: &EventBus,
        hall_id: Uuid,
        user_id: Uuid,
    ) -> Result<StudyHallSession, AppError> {
        let school_id: Uuid = sqlx::query_scalar("SELECT school_id FROM study_halls WHERE id = $1")
            .bind(hall_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| {
                AppError::not_found(anyhow!("Study hall with id {} not found", hall_id))
            })?;

        let session = sqlx::query_as::<_, StudyHallSession>(&format!(
            r#"UPDATE study_hall_sessions
            SET checked_out_at = NOW()
            WHERE study_hall_id = $1 AND user_id = $2 AND checked_out_at IS NULL
            RETURNING {SESSION_COLUMNS}"#
        ))
        .bind(hall_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::bad_request(anyhow!("You are not checked in to this study hall"))
        })?;

        let occupancy = open_session_count(db, hall_id).await?;
        metrics::set_study_hall_occupancy(&hall_id.to_string(), occupancy);
        publish_change(events, school_id, hall_id);

        Ok(session)
    }
}
