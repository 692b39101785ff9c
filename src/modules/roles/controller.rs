use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::time::Duration;
use uuid::Uuid;

use crate::middleware::auth::RequireManageRoles;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    AssignRoleDto, CreateCustomRoleDto, CustomRole, CustomRoleFilterParams,
    PaginatedCustomRolesResponse, Permission, RoleAssignmentResponse, RoleAssignmentView,
    UpdateCustomRoleDto,
};
use super::service;

/// Live priority of the caller, resolved through the cache. Assignment
/// endpoints gate on this rather than the login-time JWT snapshot.
async fn acting_priority(
    state: &AppState,
    auth_user: &crate::middleware::auth::AuthUser,
) -> Result<i32, AppError> {
    let resolved = service::resolve_user_permissions(
        &state.db,
        state.cache.as_ref(),
        Duration::from_secs(state.cache_config.permissions_ttl_seconds),
        auth_user.user_id()?,
    )
    .await?;

    Ok(resolved.priority)
}

// ============ Permission Endpoints ============

#[utoipa::path(
    get,
    path = "/api/roles/permissions",
    responses(
        (status = 200, description = "The full permission set", body = Vec<Permission>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn get_permissions(
    RequireManageRoles(_auth_user): RequireManageRoles,
) -> Json<Vec<Permission>> {
    Json(Permission::ALL.to_vec())
}

// ============ Custom Role Endpoints ============

#[utoipa::path(
    post,
    path = "/api/roles/custom",
    request_body = CreateCustomRoleDto,
    responses(
        (status = 201, description = "Role created successfully", body = CustomRole),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn create_custom_role(
    State(state): State<AppState>,
    RequireManageRoles(auth_user): RequireManageRoles,
    ValidatedJson(dto): ValidatedJson<CreateCustomRoleDto>,
) -> Result<(StatusCode, Json<CustomRole>), AppError> {
    let role = service::create_custom_role(
        &state.db,
        state.cache.as_ref(),
        dto,
        auth_user.school_id(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/roles/custom",
    params(
        ("school_id" = Option<Uuid>, Query, description = "Filter by school ID"),
        ("include_inactive" = Option<bool>, Query, description = "Include inactive roles"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("offset" = Option<i64>, Query, description = "Offset into the result set")
    ),
    responses(
        (status = 200, description = "List of custom roles", body = PaginatedCustomRolesResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn get_custom_roles(
    State(state): State<AppState>,
    RequireManageRoles(_auth_user): RequireManageRoles,
    Query(params): Query<CustomRoleFilterParams>,
) -> Result<Json<PaginatedCustomRolesResponse>, AppError> {
    let result = service::list_custom_roles(&state.db, params).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/roles/custom/{id}",
    params(
        ("id" = Uuid, Path, description = "Custom role ID")
    ),
    responses(
        (status = 200, description = "Custom role details", body = CustomRole),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn get_custom_role_by_id(
    State(state): State<AppState>,
    RequireManageRoles(_auth_user): RequireManageRoles,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomRole>, AppError> {
    let role = service::get_custom_role(&state.db, id).await?;
    Ok(Json(role))
}

#[utoipa::path(
    patch,
    path = "/api/roles/custom/{id}",
    params(
        ("id" = Uuid, Path, description = "Custom role ID")
    ),
    request_body = UpdateCustomRoleDto,
    responses(
        (status = 200, description = "Role updated successfully", body = CustomRole),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn update_custom_role(
    State(state): State<AppState>,
    RequireManageRoles(_auth_user): RequireManageRoles,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCustomRoleDto>,
) -> Result<Json<CustomRole>, AppError> {
    let role = service::update_custom_role(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/api/roles/custom/{id}",
    params(
        ("id" = Uuid, Path, description = "Custom role ID")
    ),
    responses(
        (status = 204, description = "Role deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn delete_custom_role(
    State(state): State<AppState>,
    RequireManageRoles(_auth_user): RequireManageRoles,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete_custom_role(&state.db, state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ User Role Assignment Endpoints ============

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/roles",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's role assignments", body = Vec<RoleAssignmentView>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn get_user_role_assignments(
    State(state): State<AppState>,
    RequireManageRoles(_auth_user): RequireManageRoles,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<RoleAssignmentView>>, AppError> {
    let assignments = service::get_user_assignments(&state.db, user_id).await?;
    Ok(Json(assignments))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/roles",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    request_body = AssignRoleDto,
    responses(
        (status = 201, description = "Role assigned successfully", body = RoleAssignmentResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User or role not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn assign_role_to_user(
    State(state): State<AppState>,
    RequireManageRoles(auth_user): RequireManageRoles,
    Path(user_id): Path<Uuid>,
    Json(dto): Json<AssignRoleDto>,
) -> Result<(StatusCode, Json<RoleAssignmentResponse>), AppError> {
    let acting = acting_priority(&state, &auth_user).await?;
    let email = EmailService::new(state.email_config.clone());

    let response = service::assign_role(
        &state.db,
        state.cache.as_ref(),
        &email,
        user_id,
        dto,
        acting,
        auth_user.user_id()?,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/roles/{assignment_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("assignment_id" = Uuid, Path, description = "Role assignment ID")
    ),
    responses(
        (status = 204, description = "Role removed successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Roles",
    security(("bearer_auth" = []))
)]
pub async fn remove_role_from_user(
    State(state): State<AppState>,
    RequireManageRoles(auth_user): RequireManageRoles,
    Path((user_id, assignment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let acting = acting_priority(&state, &auth_user).await?;
    let email = EmailService::new(state.email_config.clone());

    service::remove_assignment(
        &state.db,
        state.cache.as_ref(),
        &email,
        user_id,
        assignment_id,
        acting,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
