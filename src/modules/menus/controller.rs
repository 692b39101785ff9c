use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireManageMenus};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateMenuItemDto, ImportMenuDto, ImportMenuResponse, Meal, MenuDayParams, MenuDayResponse,
    MenuItem, UpdateMenuItemDto,
};
use super::service::MenuService;

#[utoipa::path(
    get,
    path = "/api/menus",
    params(
        ("date" = Option<String>, Query, description = "Day to show, YYYY-MM-DD, defaults to today"),
        ("meal" = Option<String>, Query, description = "breakfast or lunch, defaults to lunch"),
        ("school_id" = Option<Uuid>, Query, description = "School override for accounts without one")
    ),
    responses(
        (status = 200, description = "The menu for one day and meal", body = MenuDayResponse),
        (status = 400, description = "No school to show a menu for"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Menus",
    security(("bearer_auth" = []))
)]
pub async fn get_menu_day(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<MenuDayParams>,
) -> Result<Json<MenuDayResponse>, AppError> {
    let school_id = auth_user
        .school_id()
        .or(params.school_id)
        .ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!(
                "No school specified and your account has none"
            ))
        })?;
    let served_on = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let meal = params.meal.unwrap_or(Meal::Lunch);

    let day = MenuService::day_view(&state.db, state.cache.as_ref(), school_id, served_on, meal)
        .await?;

    Ok(Json(day))
}

#[utoipa::path(
    post,
    path = "/api/menus",
    request_body = CreateMenuItemDto,
    responses(
        (status = 201, description = "Menu item created", body = MenuItem),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Menus",
    security(("bearer_auth" = []))
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    RequireManageMenus(auth_user): RequireManageMenus,
    ValidatedJson(dto): ValidatedJson<CreateMenuItemDto>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let item = MenuService::create_menu_item(
        &state.db,
        state.cache.as_ref(),
        dto,
        auth_user.school_id(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    patch,
    path = "/api/menus/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = UpdateMenuItemDto,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItem),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Menu item not found")
    ),
    tag = "Menus",
    security(("bearer_auth" = []))
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    RequireManageMenus(_auth_user): RequireManageMenus,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateMenuItemDto>,
) -> Result<Json<MenuItem>, AppError> {
    let item = MenuService::update_menu_item(&state.db, state.cache.as_ref(), id, dto).await?;

    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/menus/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Menu item not found")
    ),
    tag = "Menus",
    security(("bearer_auth" = []))
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    RequireManageMenus(_auth_user): RequireManageMenus,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    MenuService::delete_menu_item(&state.db, state.cache.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/menus/import",
    request_body = ImportMenuDto,
    responses(
        (status = 200, description = "Import report, possibly zero items", body = ImportMenuResponse),
        (status = 400, description = "No menu source URL configured"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Menu page could not be fetched")
    ),
    tag = "Menus",
    security(("bearer_auth" = []))
)]
pub async fn import_menu(
    State(state): State<AppState>,
    RequireManageMenus(auth_user): RequireManageMenus,
    ValidatedJson(dto): ValidatedJson<ImportMenuDto>,
) -> Result<Json<ImportMenuResponse>, AppError> {
    let report = MenuService::import_menu(
        &state.db,
        state.cache.as_ref(),
        &state.http,
        dto,
        auth_user.school_id(),
    )
    .await?;

    Ok(Json(report))
}
