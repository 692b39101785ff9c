use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireManageStudyHalls};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateStudyHallDto, StudyHall, StudyHallListParams, StudyHallSession, StudyHallView,
    UpdateStudyHallDto,
};
use super::service::StudyHallService;

#[utoipa::path(
    get,
    path = "/api/study-halls",
    params(
        ("school_id" = Option<Uuid>, Query, description = "School override for accounts without one")
    ),
    responses(
        (status = 200, description = "Halls with live occupancy", body = Vec<StudyHallView>),
        (status = 400, description = "No school to list halls for"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Study halls",
    security(("bearer_auth" = []))
)]
pub async fn get_study_halls(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<StudyHallListParams>,
) -> Result<Json<Vec<StudyHallView>>, AppError> {
    let school_id = auth_user.school_id().or(params.school_id).ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!(
            "No school specified and your account has none"
        ))
    })?;

    let halls = StudyHallService::list_halls(&state.db, school_id).await?;

    Ok(Json(halls))
}

#[utoipa::path(
    post,
    path = "/api/study-halls",
    request_body = CreateStudyHallDto,
    responses(
        (status = 201, description = "Study hall created", body = StudyHall),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Study halls",
    security(("bearer_auth" = []))
)]
pub async fn create_study_hall(
    State(state): State<AppState>,
    RequireManageStudyHalls(auth_user): RequireManageStudyHalls,
    ValidatedJson(dto): ValidatedJson<CreateStudyHallDto>,
) -> Result<(StatusCode, Json<StudyHall>), AppError> {
    let hall =
        StudyHallService::create_hall(&state.db, &state.events, dto, auth_user.school_id()).await?;

    Ok((StatusCode::CREATED, Json(hall)))
}

#[utoipa::path(
    patch,
    path = "/api/study-halls/{id}",
    params(("id" = Uuid, Path, description = "Study hall ID")),
    request_body = UpdateStudyHallDto,
    responses(
        (status = 200, description = "Study hall updated", body = StudyHall),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Study hall not found")
    ),
    tag = "Study halls",
    security(("bearer_auth" = []))
)]
pub async fn update_study_hall(
    State(state): State<AppState>,
    RequireManageStudyHalls(_auth_user): RequireManageStudyHalls,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudyHallDto>,
) -> Result<Json<StudyHall>, AppError> {
    let hall = StudyHallService::update_hall(&state.db, &state.events, id, dto).await?;

    Ok(Json(hall))
}

#[utoipa::path(
    delete,
    path = "/api/study-halls/{id}",
    params(("id" = Uuid, Path, description = "Study hall ID")),
    responses(
        (status = 204, description = "Study hall deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Study hall not found")
    ),
    tag = "Study halls",
    security(("bearer_auth" = []))
)]
pub async fn delete_study_hall(
    State(state): State<AppState>,
    RequireManageStudyHalls(_auth_user): RequireManageStudyHalls,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    StudyHallService::delete_hall(&state.db, &state.events, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/study-halls/{id}/check-in",
    params(("id" = Uuid, Path, description = "Study hall ID")),
    responses(
        (status = 201, description = "Checked in", body = StudyHallSession),
        (status = 400, description = "Hall closed, full, or already checked in"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Study hall not found")
    ),
    tag = "Study halls",
    security(("bearer_auth" = []))
)]
pub async fn check_in(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<StudyHallSession>), AppError> {
    let user_id = auth_user.user_id()?;
    let session = StudyHallService::check_in(&state.db, &state.events, id, user_id).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/study-halls/{id}/check-out",
    params(("id" = Uuid, Path, description = "Study hall ID")),
    responses(
        (status = 200, description = "Checked out", body = StudyHallSession),
        (status = 400, description = "Not checked in to this hall"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Study hall not found")
    ),
    tag = "Study halls",
    security(("bearer_auth" = []))
)]
pub async fn check_out(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StudyHallSession>, AppError> {
    let user_id = auth_user.user_id()?;
    let session = StudyHallService::check_out(&state.db, &state.events, id, user_id).await?;

    Ok(Json(session))
}
