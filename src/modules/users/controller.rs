use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::time::Duration;
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireManageUsers};
use crate::modules::roles::hierarchy;
use crate::modules::roles::permissions::ResolvedPermissions;
use crate::modules::roles::service as roles_service;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    AccountDeletionResponse, PaginatedUsersResponse, UpdateProfileDto, UpdateUserDto, User,
    UserFilterParams,
};
use super::service::UserService;

fn permissions_ttl(state: &AppState) -> Duration {
    Duration::from_secs(state.cache_config.permissions_ttl_seconds)
}

// ============ Self-Service Endpoints ============

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "The caller's profile", body = User),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let email = EmailService::new(state.email_config.clone());
    let user = UserService::get_profile(&state.db, &email, auth_user.user_id()?).await?;

    Ok(Json(user))
}

#[utoipa::path(
    patch,
    path = "/api/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn update_my_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_profile(&state.db, auth_user.user_id()?, dto).await?;

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/me",
    responses(
        (status = 200, description = "Account deleted", body = AccountDeletionResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn delete_my_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<AccountDeletionResponse>, AppError> {
    let report =
        UserService::delete_account(&state.db, state.cache.as_ref(), auth_user.user_id()?).await?;

    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/me/permissions",
    responses(
        (status = 200, description = "The caller's resolved permissions", body = ResolvedPermissions),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn get_my_permissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ResolvedPermissions>, AppError> {
    let resolved = roles_service::resolve_user_permissions(
        &state.db,
        state.cache.as_ref(),
        permissions_ttl(&state),
        auth_user.user_id()?,
    )
    .await?;

    Ok(Json(resolved))
}

// ============ Admin Endpoints ============

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("search" = Option<String>, Query, description = "Match against name and email"),
        ("school_id" = Option<Uuid>, Query, description = "Filter by school ID"),
        ("grade_level" = Option<String>, Query, description = "Filter by grade level"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("offset" = Option<i64>, Query, description = "Offset into the result set")
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Query(params): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let users = UserService::list_users(&state.db, params).await?;

    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;

    Ok(Json(user))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    RequireManageUsers(_auth_user): RequireManageUsers,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user(&state.db, state.cache.as_ref(), id, dto).await?;

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account deleted", body = AccountDeletionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireManageUsers(auth_user): RequireManageUsers,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountDeletionResponse>, AppError> {
    let ttl = permissions_ttl(&state);
    let acting = roles_service::resolve_user_permissions(
        &state.db,
        state.cache.as_ref(),
        ttl,
        auth_user.user_id()?,
    )
    .await?;
    let target =
        roles_service::resolve_user_permissions(&state.db, state.cache.as_ref(), ttl, id).await?;

    if !hierarchy::can_manage_user(acting.priority, target.priority) {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "You cannot delete a user at or above your role priority"
        )));
    }

    let report = UserService::delete_account(&state.db, state.cache.as_ref(), id).await?;

    Ok(Json(report))
}
