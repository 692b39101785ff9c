use anyhow::anyhow;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::grades::{self, GradeLevel};
use super::model::{
    AccountDeletionResponse, PaginatedUsersResponse, TableDeletion, UpdateProfileDto,
    UpdateUserDto, User, UserFilterParams,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, school_id, grade_level, \
     last_grade_progression, created_at, updated_at";

/// Tables holding user-owned rows, cleaned in this order during account
/// deletion. Replies come before discussions so the walk counts a user's
/// replies itself instead of losing them to the discussion cascade.
/// Password resets ride on the users FK cascade and are not listed.
const OWNED_TABLES: &[(&str, &str)] = &[
    ("tasks", "user_id"),
    ("schedule_entries", "user_id"),
    ("study_hall_sessions", "user_id"),
    ("discussion_replies", "author_id"),
    ("discussions", "author_id"),
    ("brag_entries", "user_id"),
    ("feedback", "user_id"),
    ("role_assignments", "user_id"),
];

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User with id {} not found", id)))
    }

    /// Loads a profile and applies any due grade progression before
    /// returning it. Progression advances at most one step per school year;
    /// the notification email is best effort.
    #[instrument(skip(db, email))]
    pub async fn get_profile(
        db: &PgPool,
        email: &EmailService,
        user_id: Uuid,
    ) -> Result<User, AppError> {
        let user = Self::get_user(db, user_id).await?;
        Self::ensure_grade_progression(db, email, user).await
    }

    async fn ensure_grade_progression(
        db: &PgPool,
        email: &EmailService,
        user: User,
    ) -> Result<User, AppError> {
        let Some(grade_str) = user.grade_level.as_deref() else {
            return Ok(user);
        };

        let grade: GradeLevel = match grade_str.parse() {
            Ok(grade) => grade,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Skipping grade progression");
                return Ok(user);
            }
        };

        let Some(next) = grades::apply_progression(grade, user.last_grade_progression, Utc::now())
        else {
            return Ok(user);
        };

        // Guard on the previous timestamp so concurrent profile loads
        // advance the grade once, not once per request.
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
            SET grade_level = $2, last_grade_progression = NOW(), updated_at = NOW()
            WHERE id = $1 AND last_grade_progression IS NOT DISTINCT FROM $3
            RETURNING {USER_COLUMNS}"#
        ))
        .bind(user.id)
        .bind(next.as_str())
        .bind(user.last_grade_progression)
        .fetch_optional(db)
        .await?;

        match updated {
            Some(updated) => {
                info!(user_id = %updated.id, from = %grade, to = %next, "Applied grade progression");
                if let Err(e) = email
                    .send_grade_progression_email(
                        &updated.email,
                        &updated.first_name,
                        next.display_name(),
                    )
                    .await
                {
                    warn!(error = %e.error, user_id = %updated.id, "Failed to send grade progression email");
                }
                Ok(updated)
            }
            // Another request won the race; read back its result.
            None => Self::get_user(db, user.id).await,
        }
    }

    #[instrument(skip(db, dto))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        let grade_level = dto.grade_level.map(|g| g.as_str().to_string());

        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                grade_level = COALESCE($4, grade_level),
                last_grade_progression = CASE
                    WHEN $4::text IS NULL THEN last_grade_progression
                    ELSE NOW()
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(dto.first_name)
        .bind(dto.last_name)
        .bind(grade_level)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User with id {} not found", user_id)))
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        params: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = params.pagination.limit();
        let offset = params.pagination.offset();
        let search = params
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s.trim()));
        let grade_level = params.grade_level.map(|g| g.as_str().to_string());

        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users
            WHERE ($1::text IS NULL
                   OR first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1)
              AND ($2::uuid IS NULL OR school_id = $2)
              AND ($3::text IS NULL OR grade_level = $3)
            ORDER BY last_name, first_name
            LIMIT $4 OFFSET $5"#
        ))
        .bind(&search)
        .bind(params.school_id)
        .bind(&grade_level)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL
                   OR first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1)
              AND ($2::uuid IS NULL OR school_id = $2)
              AND ($3::text IS NULL OR grade_level = $3)"#,
        )
        .bind(&search)
        .bind(params.school_id)
        .bind(&grade_level)
        .fetch_one(db)
        .await?;

        let has_more = offset + (users.len() as i64) < total;

        let meta = PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        };

        Ok(PaginatedUsersResponse { data: users, meta })
    }

    /// Admin edit. `revert_grade` walks the grade one step back through the
    /// reverse map and clears the progression stamp so the next school year
    /// still advances it.
    #[instrument(skip(db, cache, dto))]
    pub async fn update_user(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        if dto.revert_grade == Some(true) && dto.grade_level.is_some() {
            return Err(AppError::bad_request(anyhow!(
                "revert_grade cannot be combined with an explicit grade_level"
            )));
        }

        let user = Self::get_user(db, id).await?;

        let (grade_level, stamp_progression) = if dto.revert_grade == Some(true) {
            let current: GradeLevel = user
                .grade_level
                .as_deref()
                .ok_or_else(|| {
                    AppError::bad_request(anyhow!("User has no grade level to revert"))
                })?
                .parse()
                .map_err(AppError::bad_request)?;
            let previous = current.previous().ok_or_else(|| {
                AppError::bad_request(anyhow!(
                    "{} is the lowest grade and cannot be reverted",
                    current.display_name()
                ))
            })?;
            (Some(previous.as_str().to_string()), false)
        } else {
            (dto.grade_level.map(|g| g.as_str().to_string()), true)
        };

        let school_changed = dto.school_id.is_some();

        let updated = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                school_id = COALESCE($4, school_id),
                grade_level = COALESCE($5, grade_level),
                last_grade_progression = CASE
                    WHEN $5::text IS NULL THEN last_grade_progression
                    WHEN $6 THEN NOW()
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.first_name)
        .bind(dto.last_name)
        .bind(dto.school_id)
        .bind(&grade_level)
        .bind(stamp_progression)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User with id {} not found", id)))?;

        // School moves change which school-scoped custom roles apply.
        if school_changed {
            keys::invalidate::user_permissions(cache, id).await;
        }

        Ok(updated)
    }

    /// Deletes an account: best-effort walk over the owned tables, then the
    /// user row. Only the final user delete failing fails the request.
    #[instrument(skip(db, cache))]
    pub async fn delete_account(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
    ) -> Result<AccountDeletionResponse, AppError> {
        // Existence check up front so a bad ID is a 404, not an empty walk.
        Self::get_user(db, user_id).await?;

        let mut tables = Vec::with_capacity(OWNED_TABLES.len());
        let mut failures = 0;

        for (table, column) in OWNED_TABLES {
            let result = sqlx::query(&format!("DELETE FROM {table} WHERE {column} = $1"))
                .bind(user_id)
                .execute(db)
                .await;

            match result {
                Ok(done) => tables.push(TableDeletion {
                    table: (*table).to_string(),
                    rows_deleted: done.rows_affected(),
                    failed: false,
                }),
                Err(e) => {
                    warn!(table = *table, error = %e, user_id = %user_id,
                        "Account deletion step failed, continuing");
                    failures += 1;
                    tables.push(TableDeletion {
                        table: (*table).to_string(),
                        rows_deleted: 0,
                        failed: true,
                    });
                }
            }
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        keys::invalidate::user_permissions(cache, user_id).await;

        info!(user_id = %user_id, failures, "Deleted account");

        Ok(AccountDeletionResponse {
            user_id,
            tables,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_walk_covers_owned_tables_in_order() {
        let tables: Vec<&str> = OWNED_TABLES.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            tables,
            vec![
                "tasks",
                "schedule_entries",
                "study_hall_sessions",
                "discussion_replies",
                "discussions",
                "brag_entries",
                "feedback",
                "role_assignments",
            ]
        );

        let replies = tables.iter().position(|t| *t == "discussion_replies");
        let discussions = tables.iter().position(|t| *t == "discussions");
        assert!(replies < discussions);
    }
}
