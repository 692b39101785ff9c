use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireManageSchools};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams, UpdateSchoolDto,
};
use super::service::SchoolService;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created successfully", body = School),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn create_school(
    State(state): State<AppState>,
    RequireManageSchools(_auth_user): RequireManageSchools,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let school = SchoolService::create_school(&state.db, dto).await?;

    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(
        ("search" = Option<String>, Query, description = "Match against name and address"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("offset" = Option<i64>, Query, description = "Offset into the result set")
    ),
    responses(
        (status = 200, description = "Paginated list of schools", body = PaginatedSchoolsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_schools(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(params): Query<SchoolFilterParams>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let schools = SchoolService::list_schools(&state.db, params).await?;

    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_school(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school(&state.db, id).await?;

    Ok(Json(school))
}

#[utoipa::path(
    patch,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = School),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn update_school(
    State(state): State<AppState>,
    RequireManageSchools(_auth_user): RequireManageSchools,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::update_school(&state.db, id, dto).await?;

    Ok(Json(school))
}

#[utoipa::path(
    delete,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 204, description = "School deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn delete_school(
    State(state): State<AppState>,
    RequireManageSchools(_auth_user): RequireManageSchools,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SchoolService::delete_school(&state.db, state.cache.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
