use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams, UpdateSchoolDto,
};

const SCHOOL_COLUMNS: &str =
    "id, name, address, signup_domain, menu_source_url, created_at, updated_at";

fn map_school_insert_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::bad_request(anyhow!(
                "Another school already uses this signup domain"
            ));
        }
    }
    AppError::from(e)
}

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(db, dto), fields(school_name = %dto.name))]
    pub async fn create_school(db: &PgPool, dto: CreateSchoolDto) -> Result<School, AppError> {
        let signup_domain = dto.signup_domain.map(|d| d.to_lowercase());

        let school = sqlx::query_as::<_, School>(&format!(
            r#"INSERT INTO schools (name, address, signup_domain, menu_source_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {SCHOOL_COLUMNS}"#
        ))
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&signup_domain)
        .bind(&dto.menu_source_url)
        .fetch_one(db)
        .await
        .map_err(map_school_insert_error)?;

        info!(school_id = %school.id, "Created school");

        Ok(school)
    }

    #[instrument(skip(db))]
    pub async fn list_schools(
        db: &PgPool,
        params: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let limit = params.pagination.limit();
        let offset = params.pagination.offset();
        let search = params
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s.trim()));

        let schools = sqlx::query_as::<_, School>(&format!(
            r#"SELECT {SCHOOL_COLUMNS} FROM schools
            WHERE ($1::text IS NULL OR name ILIKE $1 OR address ILIKE $1)
            ORDER BY name
            LIMIT $2 OFFSET $3"#
        ))
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM schools
             WHERE ($1::text IS NULL OR name ILIKE $1 OR address ILIKE $1)",
        )
        .bind(&search)
        .fetch_one(db)
        .await?;

        let has_more = offset + (schools.len() as i64) < total;

        let meta = PaginationMeta {
            total,
            limit,
            offset: Some(offset),
            page: params.pagination.page(),
            has_more,
        };

        Ok(PaginatedSchoolsResponse {
            data: schools,
            meta,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_school(db: &PgPool, id: Uuid) -> Result<School, AppError> {
        sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("School with id {} not found", id)))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_school(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        let signup_domain = dto.signup_domain.map(|d| d.to_lowercase());

        sqlx::query_as::<_, School>(&format!(
            r#"UPDATE schools
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                signup_domain = COALESCE($4, signup_domain),
                menu_source_url = COALESCE($5, menu_source_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SCHOOL_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.name)
        .bind(dto.address)
        .bind(signup_domain)
        .bind(dto.menu_source_url)
        .fetch_optional(db)
        .await
        .map_err(map_school_insert_error)?
        .ok_or_else(|| AppError::not_found(anyhow!("School with id {} not found", id)))
    }

    /// Deletes a school. Users keep their accounts (the FK sets their
    /// school link to NULL); school-scoped custom roles cascade away, so
    /// every permission cache entry is suspect afterwards.
    #[instrument(skip(db, cache))]
    pub async fn delete_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "School with id {} not found",
                id
            )));
        }

        keys::invalidate::all_user_permissions(cache).await;
        keys::invalidate::school_menus(cache, id).await;

        warn!(school_id = %id, "Deleted school");

        Ok(())
    }
}
