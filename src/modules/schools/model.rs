use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A school. `signup_domain` links self-registered accounts by email
/// domain; `menu_source_url` is where the menu importer scrapes from.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub signup_domain: Option<String>,
    pub menu_source_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    /// Bare domain, e.g. `northside.edu`. Stored lowercase.
    #[validate(length(min = 3, max = 253))]
    pub signup_domain: Option<String>,
    #[validate(url)]
    pub menu_source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 3, max = 253))]
    pub signup_domain: Option<String>,
    #[validate(url)]
    pub menu_source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SchoolFilterParams {
    /// Case-insensitive match against name and address.
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<School>,
    pub meta: crate::utils::pagination::PaginationMeta,
}
