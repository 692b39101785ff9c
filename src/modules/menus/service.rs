use anyhow::anyhow;
use axum::http::StatusCode;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::metrics;
use crate::utils::errors::AppError;

use super::importer;
use super::model::{
    CreateMenuItemDto, ImportMenuDto, ImportMenuResponse, Meal, MenuDayResponse, MenuItem,
    UpdateMenuItemDto,
};

const MENU_COLUMNS: &str = "id, school_id, served_on, meal, name, station, created_at";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

fn resolve_school(explicit: Option<Uuid>, caller: Option<Uuid>) -> Result<Uuid, AppError> {
    explicit.or(caller).ok_or_else(|| {
        AppError::bad_request(anyhow!("No school specified and your account has none"))
    })
}

pub struct MenuService;

impl MenuService {
    /// The day view, cached per school, day, and meal.
    #[instrument(skip(db, cache))]
    pub async fn day_view(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
        served_on: NaiveDate,
        meal: Meal,
    ) -> Result<MenuDayResponse, AppError> {
        let cache_key = keys::menu_day(school_id, served_on, meal.as_str());

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<MenuDayResponse>(&cache_key).await {
                return Ok(cached);
            }
        }

        let items = sqlx::query_as::<_, MenuItem>(&format!(
            r#"SELECT {MENU_COLUMNS} FROM menu_items
            WHERE school_id = $1 AND served_on = $2 AND meal = $3
            ORDER BY station NULLS LAST, name"#
        ))
        .bind(school_id)
        .bind(served_on)
        .bind(meal.as_str())
        .fetch_all(db)
        .await?;

        let response = MenuDayResponse {
            school_id,
            served_on,
            meal,
            items,
        };

        if let Some(cache) = cache {
            if let Err(e) = cache.set(&cache_key, &response).await {
                warn!(error = %e, "Failed to cache menu day view");
            }
        }

        Ok(response)
    }

    #[instrument(skip(db, cache, dto))]
    pub async fn create_menu_item(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateMenuItemDto,
        caller_school_id: Option<Uuid>,
    ) -> Result<MenuItem, AppError> {
        let school_id = resolve_school(dto.school_id, caller_school_id)?;

        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"INSERT INTO menu_items (school_id, served_on, meal, name, station)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MENU_COLUMNS}"#
        ))
        .bind(school_id)
        .bind(dto.served_on)
        .bind(dto.meal.as_str())
        .bind(&dto.name)
        .bind(&dto.station)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!(
                        "This item is already on the menu for that day and meal"
                    ));
                }
            }
            AppError::from(e)
        })?;

        keys::invalidate::school_menus(cache, school_id).await;

        Ok(item)
    }

    #[instrument(skip(db, cache, dto))]
    pub async fn update_menu_item(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
        dto: UpdateMenuItemDto,
    ) -> Result<MenuItem, AppError> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"UPDATE menu_items
            SET name = COALESCE($2, name),
                station = COALESCE($3, station)
            WHERE id = $1
            RETURNING {MENU_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.name)
        .bind(dto.station)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Menu item with id {} not found", id)))?;

        keys::invalidate::school_menus(cache, item.school_id).await;

        Ok(item)
    }

    #[instrument(skip(db, cache))]
    pub async fn delete_menu_item(
        db: &PgPool,
        cache: Option<&RedisCache>,
        id: Uuid,
    ) -> Result<(), AppError> {
        let school_id: Uuid =
            sqlx::query_scalar("DELETE FROM menu_items WHERE id = $1 RETURNING school_id")
                .bind(id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(anyhow!("Menu item with id {} not found", id))
                })?;

        keys::invalidate::school_menus(cache, school_id).await;

        Ok(())
    }

    /// Scrapes the school's configured menu page and inserts whatever items
    /// the extractor finds for the given day and meal. Zero items is a
    /// valid outcome; per-item insert failures are logged and skipped.
    #[instrument(skip(db, cache, http, dto), fields(served_on = %dto.served_on, meal = %dto.meal))]
    pub async fn import_menu(
        db: &PgPool,
        cache: Option<&RedisCache>,
        http: &reqwest::Client,
        dto: ImportMenuDto,
        caller_school_id: Option<Uuid>,
    ) -> Result<ImportMenuResponse, AppError> {
        let school_id = resolve_school(dto.school_id, caller_school_id)?;

        let source_url: Option<String> =
            sqlx::query_scalar("SELECT menu_source_url FROM schools WHERE id = $1")
                .bind(school_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(anyhow!("School with id {} not found", school_id))
                })?;

        let source_url = source_url.ok_or_else(|| {
            AppError::bad_request(anyhow!("This school has no menu source URL configured"))
        })?;

        let html = http
            .get(&source_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                AppError::new(
                    StatusCode::BAD_GATEWAY,
                    anyhow!("Failed to fetch menu page: {}", e),
                )
            })?
            .text()
            .await
            .map_err(|e| {
                AppError::new(
                    StatusCode::BAD_GATEWAY,
                    anyhow!("Failed to read menu page body: {}", e),
                )
            })?;

        let items = importer::extract_items(&html);
        let extracted = items.len();
        let mut imported: u64 = 0;

        for name in &items {
            let result = sqlx::query(
                "INSERT INTO menu_items (school_id, served_on, meal, name)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT DO NOTHING",
            )
            .bind(school_id)
            .bind(dto.served_on)
            .bind(dto.meal.as_str())
            .bind(name)
            .execute(db)
            .await;

            match result {
                Ok(done) => imported += done.rows_affected(),
                Err(e) => warn!(error = %e, item = %name, "Skipping menu item insert"),
            }
        }

        if imported > 0 {
            keys::invalidate::school_menus(cache, school_id).await;
        }

        metrics::track_menu_import(extracted, imported);

        info!(
            school_id = %school_id,
            extracted,
            imported,
            "Menu import finished"
        );

        Ok(ImportMenuResponse {
            school_id,
            served_on: dto.served_on,
            meal: dto.meal,
            extracted,
            imported: imported as usize,
            skipped_duplicates: extracted.saturating_sub(imported as usize),
        })
    }
}
