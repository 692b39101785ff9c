//! User data models and DTOs.
//!
//! # Core Types
//!
//! - [`User`] - Base user entity from the database
//! - [`UserFilterParams`] - Query parameters for the admin user listing
//!
//! # Request DTOs
//!
//! - [`UpdateProfileDto`] - Self-service profile edits (name, grade)
//! - [`UpdateUserDto`] - Admin edits, including grade corrections

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::grades::GradeLevel;

/// A user account. The password hash stays inside the service layer and
/// never appears in this struct.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: Option<Uuid>,
    /// Stored as lowercase text; see [`GradeLevel`] for the closed set.
    pub grade_level: Option<String>,
    pub last_grade_progression: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for self-service profile edits.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub grade_level: Option<GradeLevel>,
}

/// DTO for admin edits to any user.
///
/// `revert_grade` walks the grade one step back through the reverse map,
/// for correcting a progression that should not have happened. It cannot
/// be combined with an explicit `grade_level`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub school_id: Option<Uuid>,
    pub grade_level: Option<GradeLevel>,
    pub revert_grade: Option<bool>,
}

/// Query parameters for filtering users.
///
/// All filters are optional and can be combined. `search` matches name
/// and email, case-insensitively.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserFilterParams {
    pub search: Option<String>,
    pub school_id: Option<Uuid>,
    pub grade_level: Option<GradeLevel>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

/// Paginated response containing users.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: crate::utils::pagination::PaginationMeta,
}

/// Outcome of one table in the account-deletion walk.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableDeletion {
    pub table: String,
    pub rows_deleted: u64,
    pub failed: bool,
}

/// Report returned by account deletion. The walk is best effort, so the
/// caller gets told which tables were cleaned and which were skipped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountDeletionResponse {
    pub user_id: Uuid,
    pub tables: Vec<TableDeletion>,
    pub failures: usize,
}
