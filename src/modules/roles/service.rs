use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::cache::{RedisCache, keys};
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::hierarchy;
use super::model::{
    AssignRoleDto, BaseRole, CreateCustomRoleDto, CustomRole, CustomRoleFilterParams,
    CustomRoleGrant, PaginatedCustomRolesResponse, RoleAssignment, RoleAssignmentResponse,
    RoleAssignmentView, RoleGrant, UpdateCustomRoleDto,
};
use super::permissions::{self, ResolvedPermissions};

// ============ Custom Role Services ============

#[instrument(skip(db, cache))]
pub async fn create_custom_role(
    db: &PgPool,
    cache: Option<&RedisCache>,
    dto: CreateCustomRoleDto,
    default_school_id: Option<Uuid>,
) -> Result<CustomRole, AppError> {
    let school_id = dto.school_id.or(default_school_id);
    let permission_strings: Vec<String> =
        dto.permissions.iter().map(|p| p.as_str().to_string()).collect();

    let role = sqlx::query_as::<_, CustomRole>(
        r#"INSERT INTO custom_roles (school_id, name, color, icon, priority, is_active, permissions)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, school_id, name, color, icon, priority, is_active, permissions,
                  created_at, updated_at"#,
    )
    .bind(school_id)
    .bind(&dto.name)
    .bind(&dto.color)
    .bind(&dto.icon)
    .bind(dto.priority)
    .bind(dto.is_active.unwrap_or(true))
    .bind(&permission_strings)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::bad_request(anyhow!(
                    "A custom role with this name already exists in this school"
                ));
            }
        }
        AppError::from(e)
    })?;

    keys::invalidate::all_user_permissions(cache).await;

    Ok(role)
}

#[instrument(skip(db))]
pub async fn list_custom_roles(
    db: &PgPool,
    params: CustomRoleFilterParams,
) -> Result<PaginatedCustomRolesResponse, AppError> {
    let limit = params.pagination.limit();
    let offset = params.pagination.offset();
    let include_inactive = params.include_inactive.unwrap_or(false);

    let roles = sqlx::query_as::<_, CustomRole>(
        r#"SELECT id, school_id, name, color, icon, priority, is_active, permissions,
                  created_at, updated_at
        FROM custom_roles
        WHERE ($1::uuid IS NULL OR school_id = $1)
          AND ($2 OR is_active = TRUE)
        ORDER BY priority DESC, name
        LIMIT $3 OFFSET $4"#,
    )
    .bind(params.school_id)
    .bind(include_inactive)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM custom_roles
        WHERE ($1::uuid IS NULL OR school_id = $1)
          AND ($2 OR is_active = TRUE)"#,
    )
    .bind(params.school_id)
    .bind(include_inactive)
    .fetch_one(db)
    .await?;

    let has_more = offset + (roles.len() as i64) < total;

    let meta = PaginationMeta {
        total,
        limit,
        offset: Some(offset),
        page: params.pagination.page(),
        has_more,
    };

    Ok(PaginatedCustomRolesResponse { data: roles, meta })
}

#[instrument(skip(db))]
pub async fn get_custom_role(db: &PgPool, id: Uuid) -> Result<CustomRole, AppError> {
    sqlx::query_as::<_, CustomRole>(
        r#"SELECT id, school_id, name, color, icon, priority, is_active, permissions,
                  created_at, updated_at
        FROM custom_roles WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Custom role not found")))
}

#[instrument(skip(db, cache))]
pub async fn update_custom_role(
    db: &PgPool,
    cache: Option<&RedisCache>,
    id: Uuid,
    dto: UpdateCustomRoleDto,
) -> Result<CustomRole, AppError> {
    let existing = get_custom_role(db, id).await?;

    let name = dto.name.unwrap_or(existing.name);
    let color = dto.color.or(existing.color);
    let icon = dto.icon.or(existing.icon);
    let priority = dto.priority.unwrap_or(existing.priority);
    let is_active = dto.is_active.unwrap_or(existing.is_active);
    let permission_strings: Vec<String> = match dto.permissions {
        Some(permissions) => permissions.iter().map(|p| p.as_str().to_string()).collect(),
        None => existing.permissions,
    };

    let role = sqlx::query_as::<_, CustomRole>(
        r#"UPDATE custom_roles
        SET name = $1, color = $2, icon = $3, priority = $4, is_active = $5,
            permissions = $6, updated_at = NOW()
        WHERE id = $7
        RETURNING id, school_id, name, color, icon, priority, is_active, permissions,
                  created_at, updated_at"#,
    )
    .bind(&name)
    .bind(&color)
    .bind(&icon)
    .bind(priority)
    .bind(is_active)
    .bind(&permission_strings)
    .bind(id)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::bad_request(anyhow!(
                    "A custom role with this name already exists in this school"
                ));
            }
        }
        AppError::from(e)
    })?;

    keys::invalidate::all_user_permissions(cache).await;

    Ok(role)
}

#[instrument(skip(db, cache))]
pub async fn delete_custom_role(
    db: &PgPool,
    cache: Option<&RedisCache>,
    id: Uuid,
) -> Result<(), AppError> {
    // Assignments referencing the role cascade away with it.
    let result = sqlx::query("DELETE FROM custom_roles WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(anyhow!("Custom role not found")));
    }

    keys::invalidate::all_user_permissions(cache).await;

    Ok(())
}

// ============ Assignment Services ============

/// Flat row from the assignments-with-custom-role join.
#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    user_id: Uuid,
    base_role: String,
    school_id: Option<Uuid>,
    assigned_at: DateTime<Utc>,
    custom_role_id: Option<Uuid>,
    custom_school_id: Option<Uuid>,
    custom_name: Option<String>,
    custom_color: Option<String>,
    custom_icon: Option<String>,
    custom_priority: Option<i32>,
    custom_is_active: Option<bool>,
    custom_permissions: Option<Vec<String>>,
    custom_created_at: Option<DateTime<Utc>>,
    custom_updated_at: Option<DateTime<Utc>>,
}

impl AssignmentRow {
    fn custom_role(&self) -> Option<CustomRole> {
        let id = self.custom_role_id?;

        Some(CustomRole {
            id,
            school_id: self.custom_school_id,
            name: self.custom_name.clone()?,
            color: self.custom_color.clone(),
            icon: self.custom_icon.clone(),
            priority: self.custom_priority?,
            is_active: self.custom_is_active?,
            permissions: self.custom_permissions.clone()?,
            created_at: self.custom_created_at?,
            updated_at: self.custom_updated_at?,
        })
    }

    fn parse_base_role(&self) -> Option<BaseRole> {
        match BaseRole::from_str(&self.base_role) {
            Ok(role) => Some(role),
            Err(_) => {
                warn!(
                    assignment_id = %self.id,
                    base_role = %self.base_role,
                    "Skipping assignment with unknown base role"
                );
                None
            }
        }
    }

    fn into_grant(self) -> Option<RoleGrant> {
        let base_role = self.parse_base_role()?;

        let custom_role = self.custom_role().map(|role| CustomRoleGrant {
            name: role.name,
            color: role.color,
            icon: role.icon,
            priority: role.priority,
            is_active: role.is_active,
            permissions: permissions::parse_stored_permissions(&role.permissions),
        });

        Some(RoleGrant {
            base_role,
            custom_role,
        })
    }

    fn into_view(self) -> Option<RoleAssignmentView> {
        let base_role = self.parse_base_role()?;
        let custom_role = self.custom_role();

        Some(RoleAssignmentView {
            id: self.id,
            user_id: self.user_id,
            base_role,
            school_id: self.school_id,
            assigned_at: self.assigned_at,
            custom_role,
        })
    }
}

async fn fetch_assignment_rows(db: &PgPool, user_id: Uuid) -> Result<Vec<AssignmentRow>, AppError> {
    let rows = sqlx::query_as::<_, AssignmentRow>(
        r#"SELECT ra.id, ra.user_id, ra.base_role, ra.school_id, ra.assigned_at,
                  cr.id AS custom_role_id, cr.school_id AS custom_school_id,
                  cr.name AS custom_name, cr.color AS custom_color, cr.icon AS custom_icon,
                  cr.priority AS custom_priority, cr.is_active AS custom_is_active,
                  cr.permissions AS custom_permissions, cr.created_at AS custom_created_at,
                  cr.updated_at AS custom_updated_at
        FROM role_assignments ra
        LEFT JOIN custom_roles cr ON cr.id = ra.custom_role_id
        WHERE ra.user_id = $1
        ORDER BY ra.assigned_at"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

#[instrument(skip(db))]
pub async fn get_user_assignments(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<RoleAssignmentView>, AppError> {
    let rows = fetch_assignment_rows(db, user_id).await?;

    Ok(rows.into_iter().filter_map(AssignmentRow::into_view).collect())
}

/// Loads a user's assignments as resolution inputs. Rows that fail to parse
/// are skipped with a warning and contribute nothing.
#[instrument(skip(db))]
pub async fn load_role_grants(db: &PgPool, user_id: Uuid) -> Result<Vec<RoleGrant>, AppError> {
    let rows = fetch_assignment_rows(db, user_id).await?;

    Ok(rows.into_iter().filter_map(AssignmentRow::into_grant).collect())
}

/// Resolves a user's effective permissions, reading through the per-user
/// cache when one is available.
#[instrument(skip(db, cache))]
pub async fn resolve_user_permissions(
    db: &PgPool,
    cache: Option<&RedisCache>,
    ttl: Duration,
    user_id: Uuid,
) -> Result<ResolvedPermissions, AppError> {
    let cache_key = keys::user_permissions(user_id);

    if let Some(cache) = cache {
        if let Some(cached) = cache.get::<ResolvedPermissions>(&cache_key).await {
            return Ok(cached);
        }
    }

    let grants = load_role_grants(db, user_id).await?;
    let resolved = permissions::resolve(&grants);

    if let Some(cache) = cache {
        if let Err(e) = cache.set_with_ttl(&cache_key, &resolved, ttl).await {
            warn!(error = %e, user_id = %user_id, "Failed to cache resolved permissions");
        }
    }

    Ok(resolved)
}

#[instrument(skip(db, cache, email))]
pub async fn assign_role(
    db: &PgPool,
    cache: Option<&RedisCache>,
    email: &EmailService,
    target_user_id: Uuid,
    dto: AssignRoleDto,
    acting_priority: i32,
    assigned_by: Uuid,
) -> Result<RoleAssignmentResponse, AppError> {
    let target = sqlx::query_as::<_, (String, String, Option<Uuid>)>(
        "SELECT email, first_name, school_id FROM users WHERE id = $1",
    )
    .bind(target_user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

    let custom_grant = match dto.custom_role_id {
        Some(custom_role_id) => {
            let role = get_custom_role(db, custom_role_id).await?;
            Some(CustomRoleGrant {
                name: role.name,
                color: role.color,
                icon: role.icon,
                priority: role.priority,
                is_active: role.is_active,
                permissions: permissions::parse_stored_permissions(&role.permissions),
            })
        }
        None => None,
    };

    let role_priority = hierarchy::assignment_priority(dto.base_role, custom_grant.as_ref());
    if !hierarchy::can_assign_role(acting_priority, role_priority) {
        return Err(AppError::forbidden(anyhow!(
            "You cannot assign a role at or above your own priority"
        )));
    }

    let school_id = dto.school_id.or(target.2);

    let assignment_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO role_assignments (user_id, base_role, custom_role_id, school_id, assigned_by)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, base_role, custom_role_id) DO NOTHING
        RETURNING id"#,
    )
    .bind(target_user_id)
    .bind(dto.base_role.as_str())
    .bind(dto.custom_role_id)
    .bind(school_id)
    .bind(assigned_by)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::bad_request(anyhow!("User already has this role assignment")))?;

    keys::invalidate::user_permissions(cache, target_user_id).await;

    let role_name = custom_grant
        .as_ref()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| dto.base_role.display_name().to_string());

    if let Err(e) = email
        .send_role_change_email(&target.0, &target.1, &role_name, true)
        .await
    {
        warn!(error = %e.error, user_id = %target_user_id, "Failed to send role change email");
    }

    Ok(RoleAssignmentResponse {
        message: "Role assigned successfully".to_string(),
        user_id: target_user_id,
        assignment_id,
    })
}

#[instrument(skip(db, cache, email))]
pub async fn remove_assignment(
    db: &PgPool,
    cache: Option<&RedisCache>,
    email: &EmailService,
    target_user_id: Uuid,
    assignment_id: Uuid,
    acting_priority: i32,
) -> Result<(), AppError> {
    let assignment = sqlx::query_as::<_, RoleAssignment>(
        r#"SELECT id, user_id, base_role, custom_role_id, school_id, assigned_by, assigned_at
        FROM role_assignments WHERE id = $1 AND user_id = $2"#,
    )
    .bind(assignment_id)
    .bind(target_user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Role assignment not found")))?;

    let base_role = BaseRole::from_str(&assignment.base_role)
        .map_err(|e| AppError::internal(anyhow!("Stored assignment is invalid: {}", e)))?;

    let custom_grant = match assignment.custom_role_id {
        Some(custom_role_id) => {
            let role = get_custom_role(db, custom_role_id).await?;
            Some(CustomRoleGrant {
                name: role.name,
                color: role.color,
                icon: role.icon,
                priority: role.priority,
                is_active: role.is_active,
                permissions: permissions::parse_stored_permissions(&role.permissions),
            })
        }
        None => None,
    };

    let role_priority = hierarchy::assignment_priority(base_role, custom_grant.as_ref());
    if !hierarchy::can_assign_role(acting_priority, role_priority) {
        return Err(AppError::forbidden(anyhow!(
            "You cannot remove a role at or above your own priority"
        )));
    }

    sqlx::query("DELETE FROM role_assignments WHERE id = $1")
        .bind(assignment_id)
        .execute(db)
        .await?;

    keys::invalidate::user_permissions(cache, target_user_id).await;

    let target = sqlx::query_as::<_, (String, String)>(
        "SELECT email, first_name FROM users WHERE id = $1",
    )
    .bind(target_user_id)
    .fetch_optional(db)
    .await?;

    if let Some((to_email, to_name)) = target {
        let role_name = custom_grant
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| base_role.display_name().to_string());

        if let Err(e) = email
            .send_role_change_email(&to_email, &to_name, &role_name, false)
            .await
        {
            warn!(error = %e.error, user_id = %target_user_id, "Failed to send role change email");
        }
    }

    Ok(())
}
