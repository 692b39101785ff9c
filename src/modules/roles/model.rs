use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// The closed set of permissions the API knows about.
///
/// Permissions are additive: holding one grants a capability, and nothing
/// ever un-grants. Strings outside this set are rejected at the API boundary
/// when roles are created or updated; anything that sneaks into storage is
/// skipped during resolution and can never grant access.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageSchools,
    ManageMenus,
    ManageStudyHalls,
    VerifyEntries,
    ManageDiscussions,
    ViewAnalytics,
    ManageRoles,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::ManageUsers,
        Permission::ManageSchools,
        Permission::ManageMenus,
        Permission::ManageStudyHalls,
        Permission::VerifyEntries,
        Permission::ManageDiscussions,
        Permission::ViewAnalytics,
        Permission::ManageRoles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ManageSchools => "manage_schools",
            Permission::ManageMenus => "manage_menus",
            Permission::ManageStudyHalls => "manage_study_halls",
            Permission::VerifyEntries => "verify_entries",
            Permission::ManageDiscussions => "manage_discussions",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageRoles => "manage_roles",
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manage_users" => Ok(Permission::ManageUsers),
            "manage_schools" => Ok(Permission::ManageSchools),
            "manage_menus" => Ok(Permission::ManageMenus),
            "manage_study_halls" => Ok(Permission::ManageStudyHalls),
            "verify_entries" => Ok(Permission::VerifyEntries),
            "manage_discussions" => Ok(Permission::ManageDiscussions),
            "view_analytics" => Ok(Permission::ViewAnalytics),
            "manage_roles" => Ok(Permission::ManageRoles),
            other => Err(UnknownPermission(other.to_string())),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base roles assigned at signup or by admins. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BaseRole {
    Admin,
    Teacher,
    Counselor,
    Student,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown base role: {0}")]
pub struct UnknownBaseRole(pub String);

impl BaseRole {
    pub const ALL: [BaseRole; 4] = [
        BaseRole::Admin,
        BaseRole::Teacher,
        BaseRole::Counselor,
        BaseRole::Student,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseRole::Admin => "admin",
            BaseRole::Teacher => "teacher",
            BaseRole::Counselor => "counselor",
            BaseRole::Student => "student",
        }
    }

    /// Human-facing name shown on profiles.
    pub fn display_name(&self) -> &'static str {
        match self {
            BaseRole::Admin => "Admin",
            BaseRole::Teacher => "Teacher",
            BaseRole::Counselor => "Counselor",
            BaseRole::Student => "Student",
        }
    }
}

impl std::str::FromStr for BaseRole {
    type Err = UnknownBaseRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(BaseRole::Admin),
            "teacher" => Ok(BaseRole::Teacher),
            "counselor" => Ok(BaseRole::Counselor),
            "student" => Ok(BaseRole::Student),
            other => Err(UnknownBaseRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for BaseRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An admin-defined role. `permissions` holds the raw stored strings; they
/// are valid by construction for rows written through the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CustomRole {
    pub id: Uuid,
    pub school_id: Option<Uuid>,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub priority: i32,
    pub is_active: bool,
    pub permissions: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub base_role: String,
    pub custom_role_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}

/// Assignment as returned by the API, with the custom role inlined.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleAssignmentView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub base_role: BaseRole,
    pub school_id: Option<Uuid>,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
    pub custom_role: Option<CustomRole>,
}

/// A single resolved assignment: the base role plus the custom role it
/// references, if any. This is the input the permission fold and the
/// hierarchy walk operate on.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub base_role: BaseRole,
    pub custom_role: Option<CustomRoleGrant>,
}

#[derive(Debug, Clone)]
pub struct CustomRoleGrant {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub priority: i32,
    pub is_active: bool,
    pub permissions: Vec<Permission>,
}

impl RoleGrant {
    pub fn base(base_role: BaseRole) -> Self {
        Self {
            base_role,
            custom_role: None,
        }
    }

    pub fn with_custom(base_role: BaseRole, custom_role: CustomRoleGrant) -> Self {
        Self {
            base_role,
            custom_role: Some(custom_role),
        }
    }
}

// DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(max = 32, message = "Color must not exceed 32 characters"))]
    pub color: Option<String>,
    #[validate(length(max = 64, message = "Icon must not exceed 64 characters"))]
    pub icon: Option<String>,
    #[validate(range(min = 0, max = 5, message = "Priority must be between 0 and 5"))]
    pub priority: i32,
    /// Defaults to active when omitted.
    pub is_active: Option<bool>,
    /// Permissions from the closed set; unknown strings are rejected.
    pub permissions: Vec<Permission>,
    /// If provided, scopes the role to a school.
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "Color must not exceed 32 characters"))]
    pub color: Option<String>,
    #[validate(length(max = 64, message = "Icon must not exceed 64 characters"))]
    pub icon: Option<String>,
    #[validate(range(min = 0, max = 5, message = "Priority must be between 0 and 5"))]
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub permissions: Option<Vec<Permission>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleDto {
    pub base_role: BaseRole,
    pub custom_role_id: Option<Uuid>,
    /// Optional school scope for the assignment. Scope never changes what
    /// the assignment resolves to; it is carried for display and auditing.
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomRoleFilterParams {
    pub school_id: Option<Uuid>,
    /// Include inactive roles in the listing (default false).
    pub include_inactive: Option<bool>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCustomRolesResponse {
    pub data: Vec<CustomRole>,
    pub meta: crate::utils::pagination::PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleAssignmentResponse {
    pub message: String,
    pub user_id: Uuid,
    pub assignment_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn permission_strings_roundtrip() {
        for p in Permission::ALL {
            assert_eq!(Permission::from_str(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let err = Permission::from_str("manage_lunch_money").unwrap_err();
        assert!(err.to_string().contains("manage_lunch_money"));
    }

    #[test]
    fn permission_serde_uses_snake_case() {
        let json = serde_json::to_string(&Permission::ManageStudyHalls).unwrap();
        assert_eq!(json, "\"manage_study_halls\"");

        let parsed: Permission = serde_json::from_str("\"verify_entries\"").unwrap();
        assert_eq!(parsed, Permission::VerifyEntries);
    }

    #[test]
    fn permission_serde_rejects_unknown_variant() {
        let result: Result<Permission, _> = serde_json::from_str("\"delete_everything\"");
        assert!(result.is_err());
    }

    #[test]
    fn base_role_strings_roundtrip() {
        for r in BaseRole::ALL {
            assert_eq!(BaseRole::from_str(r.as_str()).unwrap(), r);
        }
        assert!(BaseRole::from_str("principal").is_err());
    }
}
