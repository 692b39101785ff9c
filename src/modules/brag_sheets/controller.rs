use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireVerifyEntries};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    BragEntry, BragStatus, CreateBragEntryDto, PendingBragEntry, ReviewBragEntryDto,
    UpdateBragEntryDto,
};
use super::service::BragSheetService;

#[utoipa::path(
    get,
    path = "/api/brag-sheet",
    responses(
        (status = 200, description = "The caller's brag-sheet entries", body = Vec<BragEntry>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn get_my_entries(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<BragEntry>>, AppError> {
    let user_id = auth_user.user_id()?;
    let entries = BragSheetService::list_entries(&state.db, user_id).await?;

    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/api/brag-sheet",
    request_body = CreateBragEntryDto,
    responses(
        (status = 201, description = "Entry created", body = BragEntry),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn create_entry(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateBragEntryDto>,
) -> Result<(StatusCode, Json<BragEntry>), AppError> {
    let user_id = auth_user.user_id()?;
    let entry = BragSheetService::create_entry(&state.db, user_id, dto).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    patch,
    path = "/api/brag-sheet/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = UpdateBragEntryDto,
    responses(
        (status = 200, description = "Entry updated and reset to pending", body = BragEntry),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn update_entry(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateBragEntryDto>,
) -> Result<Json<BragEntry>, AppError> {
    let user_id = auth_user.user_id()?;
    let entry = BragSheetService::update_entry(&state.db, user_id, id, dto).await?;

    Ok(Json(entry))
}

#[utoipa::path(
    delete,
    path = "/api/brag-sheet/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = auth_user.user_id()?;
    BragSheetService::delete_entry(&state.db, user_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/brag-sheet/pending",
    responses(
        (status = 200, description = "Pending entries for the verifier's school", body = Vec<PendingBragEntry>),
        (status = 400, description = "Verifier has no school"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn get_pending_entries(
    State(state): State<AppState>,
    RequireVerifyEntries(auth_user): RequireVerifyEntries,
) -> Result<Json<Vec<PendingBragEntry>>, AppError> {
    let school_id = auth_user.school_id().ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!(
            "Your account has no school to review entries for"
        ))
    })?;

    let entries = BragSheetService::pending_entries(&state.db, school_id).await?;

    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/api/brag-sheet/{id}/verify",
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = ReviewBragEntryDto,
    responses(
        (status = 200, description = "Entry verified", body = BragEntry),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Wrong school or missing permission"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn verify_entry(
    State(state): State<AppState>,
    RequireVerifyEntries(auth_user): RequireVerifyEntries,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ReviewBragEntryDto>,
) -> Result<Json<BragEntry>, AppError> {
    let verifier_id = auth_user.user_id()?;
    let entry = BragSheetService::review_entry(
        &state.db,
        id,
        verifier_id,
        auth_user.school_id(),
        BragStatus::Verified,
        dto,
    )
    .await?;

    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/api/brag-sheet/{id}/reject",
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = ReviewBragEntryDto,
    responses(
        (status = 200, description = "Entry rejected", body = BragEntry),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Wrong school or missing permission"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Brag sheet",
    security(("bearer_auth" = []))
)]
pub async fn reject_entry(
    State(state): State<AppState>,
    RequireVerifyEntries(auth_user): RequireVerifyEntries,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ReviewBragEntryDto>,
) -> Result<Json<BragEntry>, AppError> {
    let verifier_id = auth_user.user_id()?;
    let entry = BragSheetService::review_entry(
        &state.db,
        id,
        verifier_id,
        auth_user.school_id(),
        BragStatus::Rejected,
        dto,
    )
    .await?;

    Ok(Json(entry))
}
