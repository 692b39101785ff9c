use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::{AuthUser, RequireManageDiscussions};
use crate::modules::roles::model::Permission;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateDiscussionDto, CreateReplyDto, Discussion, DiscussionFilterParams, DiscussionReply,
    DiscussionThread, PaginatedDiscussionsResponse,
};
use super::service::DiscussionService;

#[utoipa::path(
    get,
    path = "/api/discussions",
    params(
        ("school_id" = Option<Uuid>, Query, description = "School override for accounts without one"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
        ("page" = Option<i64>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Discussions, newest first", body = PaginatedDiscussionsResponse),
        (status = 400, description = "No school to list discussions for"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn get_discussions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<DiscussionFilterParams>,
) -> Result<Json<PaginatedDiscussionsResponse>, AppError> {
    let school_id = auth_user.school_id().or(params.school_id).ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!(
            "No school specified and your account has none"
        ))
    })?;

    let discussions = DiscussionService::list_discussions(&state.db, school_id, params).await?;

    Ok(Json(discussions))
}

#[utoipa::path(
    post,
    path = "/api/discussions",
    request_body = CreateDiscussionDto,
    responses(
        (status = 201, description = "Discussion created", body = Discussion),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn create_discussion(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateDiscussionDto>,
) -> Result<(StatusCode, Json<Discussion>), AppError> {
    let author_id = auth_user.user_id()?;
    let discussion = DiscussionService::create_discussion(
        &state.db,
        &state.events,
        dto,
        author_id,
        auth_user.school_id(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(discussion)))
}

#[utoipa::path(
    get,
    path = "/api/discussions/{id}",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "The discussion with all replies", body = DiscussionThread),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Discussion not found")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn get_discussion(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscussionThread>, AppError> {
    let thread = DiscussionService::get_thread(&state.db, id).await?;

    Ok(Json(thread))
}

#[utoipa::path(
    post,
    path = "/api/discussions/{id}/replies",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    request_body = CreateReplyDto,
    responses(
        (status = 201, description = "Reply posted", body = DiscussionReply),
        (status = 400, description = "Discussion is locked"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Discussion not found")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn create_reply(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateReplyDto>,
) -> Result<(StatusCode, Json<DiscussionReply>), AppError> {
    let author_id = auth_user.user_id()?;
    let reply = DiscussionService::add_reply(&state.db, &state.events, id, author_id, dto).await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

#[utoipa::path(
    delete,
    path = "/api/discussions/{id}",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 204, description = "Discussion deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author and no moderation permission"),
        (status = 404, description = "Discussion not found")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn delete_discussion(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let caller_id = auth_user.user_id()?;
    let can_moderate = auth_user.has_permission(Permission::ManageDiscussions);

    DiscussionService::delete_discussion(&state.db, &state.events, id, caller_id, can_moderate)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/discussions/{id}/replies/{reply_id}",
    params(
        ("id" = Uuid, Path, description = "Discussion ID"),
        ("reply_id" = Uuid, Path, description = "Reply ID")
    ),
    responses(
        (status = 204, description = "Reply deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author and no moderation permission"),
        (status = 404, description = "Reply not found")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn delete_reply(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, reply_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let caller_id = auth_user.user_id()?;
    let can_moderate = auth_user.has_permission(Permission::ManageDiscussions);

    DiscussionService::delete_reply(
        &state.db,
        &state.events,
        id,
        reply_id,
        caller_id,
        can_moderate,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/discussions/{id}/lock",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Discussion locked", body = Discussion),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Discussion not found")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn lock_discussion(
    State(state): State<AppState>,
    RequireManageDiscussions(_auth_user): RequireManageDiscussions,
    Path(id): Path<Uuid>,
) -> Result<Json<Discussion>, AppError> {
    let discussion = DiscussionService::set_locked(&state.db, &state.events, id, true).await?;

    Ok(Json(discussion))
}

#[utoipa::path(
    post,
    path = "/api/discussions/{id}/unlock",
    params(("id" = Uuid, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Discussion unlocked", body = Discussion),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Discussion not found")
    ),
    tag = "Discussions",
    security(("bearer_auth" = []))
)]
pub async fn unlock_discussion(
    State(state): State<AppState>,
    RequireManageDiscussions(_auth_user): RequireManageDiscussions,
    Path(id): Path<Uuid>,
) -> Result<Json<Discussion>, AppError> {
    let discussion = DiscussionService::set_locked(&state.db, &state.events, id, false).await?;

    Ok(Json(discussion))
}
